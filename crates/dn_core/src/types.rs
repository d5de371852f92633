use serde::{Deserialize, Serialize};

/// One extracted article. Immutable once built; `publish_date` is a
/// `YYYY-MM-DD` calendar date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub title: String,
    pub url: String,
    pub origin: String,
    pub summary: String,
    pub publish_date: String,
}

/// The uniform result envelope every crawler returns.
///
/// `news_list: None` is not necessarily an error: the no-data case keeps
/// `status: "OK"` with an explanatory `err_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub news_list: Option<Vec<News>>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub err_code: Option<String>,
    #[serde(default)]
    pub err_info: Option<String>,
}

fn default_status() -> String {
    "OK".to_string()
}

pub const NO_DATA_INFO: &str = "未在时效范围内爬取到数据";

impl NewsResponse {
    pub fn ok(news_list: Vec<News>) -> Self {
        Self {
            news_list: Some(news_list),
            status: "OK".to_string(),
            err_code: None,
            err_info: None,
        }
    }

    /// Nothing inside the freshness window. Kept as status "OK" with a
    /// populated `err_info`, matching the upstream convention.
    pub fn no_data() -> Self {
        Self {
            news_list: None,
            status: "OK".to_string(),
            err_code: None,
            err_info: Some(NO_DATA_INFO.to_string()),
        }
    }

    pub fn error(code: &str, info: impl Into<String>) -> Self {
        Self {
            news_list: None,
            status: "ERROR".to_string(),
            err_code: Some(code.to_string()),
            err_info: Some(info.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

impl Default for NewsResponse {
    fn default() -> Self {
        Self {
            news_list: None,
            status: default_status(),
            err_code: None,
            err_info: None,
        }
    }
}
