use serde::{Deserialize, Serialize};

/// Every web API response is wrapped in `{code, message, data}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedDynamic {
    pub dyn_id_str: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateDynamicRequest<'a> {
    pub dyn_req: DynamicBody<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DynamicBody<'a> {
    pub content: DynamicContent<'a>,
    /// 1 = plain text dynamic.
    pub scene: u8,
    pub meta: DynamicMeta,
}

#[derive(Debug, Serialize)]
pub(crate) struct DynamicContent<'a> {
    pub contents: Vec<ContentPiece<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContentPiece<'a> {
    pub raw_text: &'a str,
    /// 1 = text run.
    #[serde(rename = "type")]
    pub kind: u8,
    pub biz_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DynamicMeta {
    pub app_meta: AppMeta,
}

#[derive(Debug, Serialize)]
pub(crate) struct AppMeta {
    pub from: &'static str,
    pub mobi_app: &'static str,
}

impl<'a> CreateDynamicRequest<'a> {
    pub(crate) fn text(raw_text: &'a str) -> Self {
        Self {
            dyn_req: DynamicBody {
                content: DynamicContent {
                    contents: vec![ContentPiece {
                        raw_text,
                        kind: 1,
                        biz_id: "",
                    }],
                },
                scene: 1,
                meta: DynamicMeta {
                    app_meta: AppMeta {
                        from: "create.dynamic.web",
                        mobi_app: "web",
                    },
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RemoveDynamicRequest<'a> {
    pub dyn_id_str: &'a str,
}
