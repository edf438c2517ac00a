//! Dropbox v2 API backend.
//!
//! Uses the blocking `reqwest` client. Only the four endpoints needed here are wrapped:
//! `files/list_folder`, `files/list_folder/continue`, `files/download` and
//! `users/get_current_account`.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DropboxConfig;
use crate::error::{IngestionError, IngestionResult};

use super::{ListPage, RemoteEntry, RemoteStore};

const API_BASE: &str = "https://api.dropboxapi.com/2";
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

#[derive(Debug, Serialize)]
struct ListFolderArg<'a> {
    path: &'a str,
    recursive: bool,
}

#[derive(Debug, Serialize)]
struct ListFolderContinueArg<'a> {
    cursor: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(rename = ".tag")]
    tag: String,
    #[serde(default)]
    path_display: Option<String>,
    #[serde(default)]
    path_lower: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    name: AccountName,
}

#[derive(Debug, Deserialize)]
struct AccountName {
    display_name: String,
}

/// Dropbox-backed [`RemoteStore`].
///
/// Construct once and pass by reference to the lister and the ingestor.
pub struct DropboxClient {
    http: Client,
    token: String,
    api_base: String,
    content_base: String,
}

impl std::fmt::Debug for DropboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropboxClient")
            .field("api_base", &self.api_base)
            .field("content_base", &self.content_base)
            .finish_non_exhaustive()
    }
}

impl DropboxClient {
    /// Build a client from configuration.
    pub fn new(config: &DropboxConfig) -> IngestionResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestionError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            token: config.access_token.clone(),
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
        })
    }

    /// Point the client at different API hosts (e.g. a local mock server).
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        content_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.content_base = content_base.into();
        self
    }

    /// Check the token by fetching the current account; returns its display name.
    pub fn verify_account(&self) -> IngestionResult<String> {
        let url = format!("{}/users/get_current_account", self.api_base);
        let resp = self.send(
            "users/get_current_account",
            self.http
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body("null"),
        )?;
        let account: Account = parse_json("users/get_current_account", resp)?;
        info!(account = %account.name.display_name, "dropbox account verified");
        Ok(account.name.display_name)
    }

    fn send(&self, context: &str, req: RequestBuilder) -> IngestionResult<Response> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| unavailable(context, e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(unavailable(context, format!("HTTP {status}: {body}")))
    }

    fn list_call(
        &self,
        endpoint: &str,
        context: &str,
        body: &impl Serialize,
    ) -> IngestionResult<ListPage> {
        let url = format!("{}/{endpoint}", self.api_base);
        let resp = self.send(context, self.http.post(url).json(body))?;
        let result: ListFolderResult = parse_json(context, resp)?;
        Ok(into_page(result))
    }
}

impl RemoteStore for DropboxClient {
    fn list_folder(&self, path: &str, recursive: bool) -> IngestionResult<ListPage> {
        let path = api_path(path);
        debug!(path, recursive, "files/list_folder");
        self.list_call(
            "files/list_folder",
            path,
            &ListFolderArg { path, recursive },
        )
    }

    fn list_folder_continue(&self, cursor: &str) -> IngestionResult<ListPage> {
        debug!("files/list_folder/continue");
        self.list_call(
            "files/list_folder/continue",
            "files/list_folder/continue",
            &ListFolderContinueArg { cursor },
        )
    }

    fn download(&self, path: &str) -> IngestionResult<Box<dyn Read + Send>> {
        let arg = serde_json::to_string(&DownloadArg { path })
            .map_err(|e| unavailable(path, e.to_string()))?;
        let url = format!("{}/files/download", self.content_base);
        debug!(path, "files/download");
        let resp = self.send(
            path,
            self.http
                .post(url)
                .header("Dropbox-API-Arg", header_safe_json(&arg)),
        )?;
        Ok(Box::new(resp))
    }
}

fn unavailable(context: &str, message: String) -> IngestionError {
    IngestionError::RemoteUnavailable {
        path: context.to_string(),
        message,
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(context: &str, resp: Response) -> IngestionResult<T> {
    resp.json::<T>()
        .map_err(|e| unavailable(context, format!("unexpected response: {e}")))
}

fn into_page(result: ListFolderResult) -> ListPage {
    let entries = result
        .entries
        .into_iter()
        .filter_map(|m| {
            let path = m.path_display.or(m.path_lower)?;
            match m.tag.as_str() {
                "file" => Some(RemoteEntry::file(path)),
                "folder" => Some(RemoteEntry::folder(path)),
                // "deleted" entries only appear when include_deleted is set.
                _ => None,
            }
        })
        .collect();
    ListPage {
        entries,
        cursor: Some(result.cursor),
        has_more: result.has_more,
    }
}

/// Dropbox addresses the account root as `""`, not `"/"`.
fn api_path(path: &str) -> &str {
    if path == "/" { "" } else { path }
}

/// HTTP header values must be ASCII; Dropbox expects non-ASCII characters in `Dropbox-API-Arg`
/// escaped as `\uXXXX`.
fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}
