use rand::{thread_rng, Rng};
use reqwest::{StatusCode, Url};

use crate::{settings::AccountSettings, Error, Result};

const SETTINGS_ENDPOINT: &str = "/server-side/settings";

/// Downloads account settings from the settings endpoint.
pub(crate) struct SettingsFetcher {
    client: reqwest::blocking::Client,
    url: Url,
}

impl SettingsFetcher {
    pub fn new(base_url: &str, account_id: u64, sdk_key: &str) -> Result<SettingsFetcher> {
        let url = Url::parse_with_params(
            &format!("{base_url}{SETTINGS_ENDPOINT}"),
            &[
                ("a", account_id.to_string().as_str()),
                ("i", sdk_key),
                ("platform", "server"),
                ("api-version", "1"),
            ],
        )
        .map_err(Error::InvalidBaseUrl)?;

        Ok(SettingsFetcher {
            client: reqwest::blocking::Client::new(),
            url,
        })
    }

    /// Request URL with a fresh cache-busting `r` parameter.
    fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("r", &thread_rng().gen::<f64>().to_string());
        url
    }

    /// Fetch and compile settings.
    pub fn fetch(&self) -> Result<AccountSettings> {
        log::debug!(target: "vwo", "fetching account settings");
        let response = self.client.get(self.request_url()).send()?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes()?;
                let settings = AccountSettings::from_json(&body)?;
                log::info!(target: "vwo",
                           account_id = settings.account_id,
                           version = settings.version,
                           campaigns = settings.campaigns.len();
                           "successfully fetched account settings");
                Ok(settings)
            }
            StatusCode::UNAUTHORIZED => {
                log::warn!(target: "vwo", "client is not authorized. Check your SDK key");
                Err(Error::Unauthorized)
            }
            status => {
                log::warn!(target: "vwo", "received non-200 response while fetching settings: {status:?}");
                Err(Error::UnexpectedStatus(status.as_u16()))
            }
        }
    }
}
