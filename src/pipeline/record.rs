use crate::error::Result;
use crate::page_utils::{extract_team_name, extract_year, PageType};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// One classified wiki page, as written to the output file.
///
/// Built in one go from the page url, so a record either carries all five
/// fields or does not exist. Only the text changes afterwards, while the
/// pipeline filters and transforms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    url: String,
    #[serde(rename = "pagetype")]
    page_type: PageType,
    #[serde(rename = "teamname")]
    team_name: String,
    year: String,
    #[serde(rename = "pagetext")]
    page_text: String,
}

impl PageRecord {
    pub fn new(url: &Url, page_type: PageType, page_text: String) -> Result<Self> {
        let url = url.to_string();
        let team_name = extract_team_name(&url)?;
        let year = extract_year(&url)?;
        Ok(Self {
            url,
            page_type,
            team_name,
            year,
            page_text,
        })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }
    pub fn get_page_type(&self) -> PageType {
        self.page_type
    }
    pub fn get_team_name(&self) -> &str {
        &self.team_name
    }
    pub fn get_year(&self) -> &str {
        &self.year
    }
    pub fn get_page_text(&self) -> &str {
        &self.page_text
    }
    pub(crate) fn set_page_text(&mut self, text: String) {
        self.page_text = text;
    }
}
