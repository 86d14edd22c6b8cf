use super::{Answer, Comment, ResultItem, SearchBackend, SearchError, SearchRequest, SearchResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Public Stack Exchange REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.stackexchange.com/2.3";

const DEFAULT_SITE: &str = "stackoverflow";
const DEFAULT_SORT: &str = "relevance";
const DEFAULT_ORDER: &str = "desc";

/// The API refuses page sizes above this
const MAX_PAGE_SIZE: u32 = 100;

/// Vectorized endpoints accept at most this many ids
const MAX_IDS_PER_REQUEST: usize = 100;

/// Stop paging a single child listing after this many pages
const MAX_CHILD_PAGES: u32 = 10;

/// Built-in filter used when creating the markdown one fails
const BASE_FILTER: &str = "withbody";

/// Fields added on top of the base filter so bodies arrive as markdown
const MARKDOWN_FIELDS: &str = "question.body_markdown;answer.body_markdown;comment.body_markdown";

/// Column width handed to the HTML converter; the views wrap again later
const HTML_TEXT_WIDTH: usize = 10_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope every API response is wrapped in
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
    error_id: Option<i64>,
    error_name: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    question_id: u64,
    #[serde(default)]
    title: String,
    body_markdown: Option<String>,
    body: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    view_count: u64,
    link: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerDto {
    answer_id: u64,
    question_id: u64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    is_accepted: bool,
    body_markdown: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentDto {
    post_id: u64,
    #[serde(default)]
    score: i64,
    owner: Option<OwnerDto>,
    body_markdown: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwnerDto {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FilterDto {
    filter: String,
}

/// One page of a listing
struct Page<T> {
    items: Vec<T>,
    has_more: bool,
}

/// Prefer the markdown source. Without it the body is HTML, which the
/// markdown renderer would drop, so it is flattened to text first.
fn pick_body(markdown: Option<String>, html: Option<String>) -> String {
    match (markdown, html) {
        (Some(markdown), _) => decode_entities(&markdown),
        (None, Some(html)) => html_to_text(&html),
        (None, None) => String::new(),
    }
}

/// Flatten an HTML body to plain text, entities included
fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH) {
        Ok(text) => text.trim_end().to_string(),
        Err(err) => {
            warn!(error = %err, "Failed to convert HTML body");
            decode_entities(html)
        }
    }
}

impl From<CommentDto> for Comment {
    fn from(dto: CommentDto) -> Self {
        Comment {
            owner: dto
                .owner
                .and_then(|o| o.display_name)
                .map(|name| decode_entities(&name))
                .unwrap_or_else(|| "anonymous".to_string()),
            score: dto.score,
            body: pick_body(dto.body_markdown, dto.body),
        }
    }
}

/// Search client for the Stack Exchange API.
///
/// A search is the question search, then the answers, question comments
/// and answer comments for the returned ids. The first search may also
/// create the markdown filter.
#[derive(Debug, Clone)]
pub struct StackExchangeClient {
    http: reqwest::Client,
    base_url: String,
    /// Filter named in the config; `None` builds a markdown filter on first use
    filter: Option<String>,
    markdown_filter: Arc<OnceCell<String>>,
    page_size: u32,
    api_key: Option<String>,
}

impl StackExchangeClient {
    pub fn new(
        filter: Option<String>,
        page_size: u32,
        api_key: Option<String>,
    ) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("stackask/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SearchError::Client)?;

        Ok(Self {
            http,
            base_url: DEFAULT_API_BASE.to_string(),
            filter: filter.filter(|f| !f.trim().is_empty()),
            markdown_filter: Arc::new(OnceCell::new()),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            api_key,
        })
    }

    /// Point the client at another API root (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The filter to send with every request.
    ///
    /// Filters are immutable and public, so the markdown one is created once
    /// and reused. If creating it fails we fall back to `withbody` and the
    /// HTML bodies get flattened to text instead.
    async fn resolve_filter(&self) -> String {
        if let Some(ref filter) = self.filter {
            return filter.clone();
        }
        match self
            .markdown_filter
            .get_or_try_init(|| self.create_markdown_filter())
            .await
        {
            Ok(filter) => filter.clone(),
            Err(err) => {
                warn!(error = %err, "Failed to create markdown filter, using {}", BASE_FILTER);
                BASE_FILTER.to_string()
            }
        }
    }

    async fn create_markdown_filter(&self) -> Result<String, SearchError> {
        let params = [
            ("base", BASE_FILTER.to_string()),
            ("include", MARKDOWN_FIELDS.to_string()),
            ("unsafe", "false".to_string()),
        ];
        let page: Page<FilterDto> = self.get("/filters/create", &params).await?;
        let filter = page
            .items
            .into_iter()
            .next()
            .map(|dto| dto.filter)
            .ok_or_else(|| SearchError::Backend("filter creation returned no filter".to_string()))?;
        info!(%filter, "Created markdown filter");
        Ok(filter)
    }

    fn common_params(&self, site: &str, filter: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("site", non_empty_or(site, DEFAULT_SITE)),
            ("filter", filter.to_string()),
        ];
        if let Some(ref key) = self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<Page<T>, SearchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| SearchError::Http {
                url: url.clone(),
                source,
            })?;

        // The API reports errors as a JSON envelope with a non-2xx status,
        // so decode first and only fall back to the status code.
        let status = response.status();
        let envelope = match response.json::<ApiResponse<T>>().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SearchError::Status {
                    url,
                    status: status.as_u16(),
                })
            }
            Err(source) => return Err(SearchError::Decode { url, source }),
        };

        if let Some(id) = envelope.error_id {
            return Err(SearchError::Api {
                id,
                name: envelope.error_name.unwrap_or_default(),
                message: envelope.error_message.unwrap_or_default(),
            });
        }

        Ok(Page {
            items: envelope.items,
            has_more: envelope.has_more,
        })
    }

    async fn search_questions(
        &self,
        request: &SearchRequest,
        filter: &str,
    ) -> Result<Vec<QuestionDto>, SearchError> {
        let p = &request.params;
        let mut params = self.common_params(&p.site, filter);
        params.extend([
            ("q", request.query.clone()),
            ("sort", non_empty_or(&p.sort, DEFAULT_SORT)),
            ("order", non_empty_or(&p.order, DEFAULT_ORDER)),
            ("pagesize", self.page_size.to_string()),
        ]);
        if !p.tags.trim().is_empty() {
            params.push(("tagged", p.tags.trim().to_string()));
        }
        Ok(self.get("/search/advanced", &params).await?.items)
    }

    /// Every `child` (answers, comments) of the posts in `ids`.
    ///
    /// Ids go in batches the API accepts and each batch is paged until
    /// `has_more` clears, so posts late in the ranking keep their children.
    async fn children<T: DeserializeOwned>(
        &self,
        kind: &str,
        ids: &[u64],
        child: &str,
        site: &str,
        filter: &str,
    ) -> Result<Vec<T>, SearchError> {
        let mut all = Vec::new();
        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let joined = batch.iter().map(u64::to_string).collect::<Vec<_>>().join(";");
            let path = format!("/{kind}/{joined}/{child}");

            for page in 1..=MAX_CHILD_PAGES {
                let mut params = self.common_params(site, filter);
                params.extend([
                    ("pagesize", MAX_PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                    ("sort", "votes".to_string()),
                    ("order", "desc".to_string()),
                ]);
                let result: Page<T> = self.get(&path, &params).await?;
                all.extend(result.items);
                if !result.has_more {
                    break;
                }
                if page == MAX_CHILD_PAGES {
                    warn!(%path, pages = page, "Giving up paging, listing truncated");
                }
            }
        }
        Ok(all)
    }
}

impl SearchBackend for StackExchangeClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
        let site = &request.params.site;
        let filter = self.resolve_filter().await;
        let questions = self.search_questions(request, &filter).await?;
        if questions.is_empty() {
            return Ok(SearchResult::default());
        }

        let question_ids: Vec<u64> = questions.iter().map(|q| q.question_id).collect();
        let answers: Vec<AnswerDto> = self
            .children("questions", &question_ids, "answers", site, &filter)
            .await?;

        // Comments are a nice-to-have; a failure here should not lose the answers
        let question_comments: Vec<CommentDto> = self
            .children("questions", &question_ids, "comments", site, &filter)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch question comments");
                Vec::new()
            });
        let answer_ids: Vec<u64> = answers.iter().map(|a| a.answer_id).collect();
        let answer_comments: Vec<CommentDto> = self
            .children("answers", &answer_ids, "comments", site, &filter)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch answer comments");
                Vec::new()
            });

        Ok(assemble(questions, answers, question_comments, answer_comments))
    }
}

/// Stitch the separately fetched answers and comments onto their questions,
/// keeping the question order of the search and the answer order of the API.
fn assemble(
    questions: Vec<QuestionDto>,
    answers: Vec<AnswerDto>,
    question_comments: Vec<CommentDto>,
    answer_comments: Vec<CommentDto>,
) -> SearchResult {
    let mut comments_by_post: HashMap<u64, Vec<Comment>> = HashMap::new();
    for dto in question_comments.into_iter().chain(answer_comments) {
        comments_by_post.entry(dto.post_id).or_default().push(dto.into());
    }

    let mut answers_by_question: HashMap<u64, Vec<Answer>> = HashMap::new();
    for dto in answers {
        answers_by_question.entry(dto.question_id).or_default().push(Answer {
            id: dto.answer_id,
            score: dto.score,
            is_accepted: dto.is_accepted,
            comments: comments_by_post.remove(&dto.answer_id).unwrap_or_default(),
            body: pick_body(dto.body_markdown, dto.body),
        });
    }

    let items = questions
        .into_iter()
        .map(|q| ResultItem {
            id: q.question_id,
            title: decode_entities(&q.title),
            score: q.score,
            view_count: q.view_count,
            answers: answers_by_question.remove(&q.question_id).unwrap_or_default(),
            comments: comments_by_post.remove(&q.question_id).unwrap_or_default(),
            link: q.link,
            tags: q.tags,
            body: pick_body(q.body_markdown, q.body),
        })
        .collect();

    SearchResult::new(items)
}

fn non_empty_or(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Decode the HTML entities the API escapes in titles and markdown bodies.
/// Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        // Entities are short; don't scan arbitrarily far for a ';'
        let end = candidate
            .char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .map(|(i, _)| i);

        let decoded = end.and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities_named() {
        assert_eq!(decode_entities("a &amp;&amp; b &lt;T&gt;"), "a && b <T>");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
    }

    #[test]
    fn test_decode_entities_numeric() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("it&#x27;s"), "it's");
    }

    #[test]
    fn test_decode_entities_leaves_unknown_and_bare_ampersands() {
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&bogus; stays"), "&bogus; stays");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn test_non_empty_or_falls_back() {
        assert_eq!(non_empty_or("", DEFAULT_SITE), "stackoverflow");
        assert_eq!(non_empty_or("  ", DEFAULT_ORDER), "desc");
        assert_eq!(non_empty_or("superuser", DEFAULT_SITE), "superuser");
    }

    #[test]
    fn test_api_error_envelope_decodes() {
        let json = r#"{"error_id":502,"error_name":"throttle_violation","error_message":"too many requests"}"#;
        let envelope: ApiResponse<QuestionDto> = serde_json::from_str(json).unwrap();
        assert!(envelope.items.is_empty());
        assert_eq!(envelope.error_id, Some(502));
        assert_eq!(envelope.error_name.as_deref(), Some("throttle_violation"));
    }

    #[test]
    fn test_assemble_attaches_answers_and_comments() {
        let questions: ApiResponse<QuestionDto> = serde_json::from_str(
            r#"{"items":[
                {"question_id":1,"title":"How do I &quot;borrow&quot;?","body_markdown":"body one","score":5,"view_count":100,"link":"https://stackoverflow.com/q/1","tags":["rust"]},
                {"question_id":2,"title":"Second","body":"<p>html body</p>","score":-1,"view_count":7}
            ]}"#,
        )
        .unwrap();
        let answers: ApiResponse<AnswerDto> = serde_json::from_str(
            r#"{"items":[
                {"answer_id":10,"question_id":1,"score":9,"is_accepted":true,"body_markdown":"first"},
                {"answer_id":11,"question_id":1,"score":2,"body_markdown":"second"}
            ]}"#,
        )
        .unwrap();
        let question_comments: ApiResponse<CommentDto> = serde_json::from_str(
            r#"{"items":[{"post_id":1,"score":3,"owner":{"display_name":"ferris"},"body_markdown":"nice"}]}"#,
        )
        .unwrap();
        let answer_comments: ApiResponse<CommentDto> =
            serde_json::from_str(r#"{"items":[{"post_id":11,"body_markdown":"agreed"}]}"#).unwrap();

        let result = assemble(
            questions.items,
            answers.items,
            question_comments.items,
            answer_comments.items,
        );

        assert_eq!(result.items.len(), 2);
        let first = &result.items[0];
        assert_eq!(first.title, "How do I \"borrow\"?");
        assert_eq!(first.body, "body one");
        assert_eq!(first.tags, vec!["rust"]);
        assert_eq!(first.answers.iter().map(|a| a.id).collect::<Vec<_>>(), vec![10, 11]);
        assert!(first.answers[0].is_accepted);
        assert_eq!(first.comments.len(), 1);
        assert_eq!(first.comments[0].owner, "ferris");
        assert_eq!(first.answers[1].comments[0].owner, "anonymous");

        let second = &result.items[1];
        assert_eq!(second.body, "html body");
        assert!(second.answers.is_empty());
        assert!(second.link.is_none());
    }

    #[test]
    fn test_html_body_keeps_its_prose() {
        let html = "<p>Use <code>Vec&lt;String&gt;</code> here, it&#39;s fine.</p>\n<pre><code>let v = vec![1];\n</code></pre>";
        let body = pick_body(None, Some(html.to_string()));

        assert!(body.contains("Use"), "{body}");
        assert!(body.contains("Vec<String>"), "{body}");
        assert!(body.contains("it's fine."), "{body}");
        assert!(body.contains("let v = vec![1];"), "{body}");
        assert!(!body.contains("<p>"), "{body}");
    }

    #[test]
    fn test_html_body_survives_into_document() {
        let item = ResultItem {
            id: 1,
            title: "T".to_string(),
            body: pick_body(
                None,
                Some("<p>Prefer iterators over indexing here.</p>".to_string()),
            ),
            answers: vec![Answer {
                body: pick_body(None, Some("<p>Call <b>collect</b> at the end.</p>".to_string())),
                ..Default::default()
            }],
            ..Default::default()
        };

        let doc = crate::projection::build_document(&item, 60);
        let text: String = doc
            .lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Prefer iterators over indexing here."), "{text}");
        assert!(text.contains("collect"), "{text}");
        assert!(text.contains("at the end."), "{text}");
    }

    #[test]
    fn test_markdown_body_wins_over_html() {
        let body = pick_body(Some("a &amp;&amp; b".to_string()), Some("<p>html</p>".to_string()));
        assert_eq!(body, "a && b");
        assert_eq!(pick_body(None, None), "");
    }

    // HTTP tests run the client against a throwaway local server

    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Maps (path, query) to (status, body)
    type Responder = fn(&str, &str) -> (u16, String);

    /// Serve canned responses, one connection per request. Returns the base
    /// URL and the request targets seen so far.
    async fn serve(responder: Responder) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
                let (status, body) = responder(path, query);
                log.lock().unwrap().push(target.clone());

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), seen)
    }

    fn client(base_url: &str, filter: Option<&str>) -> StackExchangeClient {
        StackExchangeClient::new(filter.map(String::from), 25, None)
            .unwrap()
            .with_base_url(base_url)
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            params: Default::default(),
        }
    }

    fn has_param(query: &str, param: &str) -> bool {
        query.split('&').any(|p| p == param)
    }

    #[tokio::test]
    async fn test_error_envelope_becomes_api_error() {
        let (base, _) = serve(|_, _| {
            (
                400,
                r#"{"error_id":400,"error_name":"bad_parameter","error_message":"site is required"}"#
                    .to_string(),
            )
        })
        .await;

        let err = client(&base, Some("withbody")).search(&request("vim")).await.unwrap_err();
        match err {
            SearchError::Api { id, name, message } => {
                assert_eq!(id, 400);
                assert_eq!(name, "bad_parameter");
                assert_eq!(message, "site is required");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_becomes_status() {
        let (base, _) = serve(|_, _| (502, "Bad Gateway".to_string())).await;

        let err = client(&base, Some("withbody")).search(&request("vim")).await.unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 502, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_garbage_body_becomes_decode_error() {
        let (base, _) = serve(|_, _| (200, "not json at all".to_string())).await;

        let err = client(&base, Some("withbody")).search(&request("vim")).await.unwrap_err();
        assert!(matches!(err, SearchError::Decode { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_empty_items_is_empty_result() {
        let (base, seen) = serve(|_, _| (200, r#"{"items":[],"has_more":false}"#.to_string())).await;

        let result = client(&base, Some("withbody")).search(&request("vim")).await.unwrap();
        assert!(result.is_empty());
        // No follow-up requests for answers or comments
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_markdown_filter_is_created_once_and_used() {
        let (base, seen) = serve(|path, _| {
            if path == "/filters/create" {
                (200, r#"{"items":[{"filter":"mdfilter"}]}"#.to_string())
            } else {
                (200, r#"{"items":[]}"#.to_string())
            }
        })
        .await;

        let client = client(&base, None);
        client.search(&request("first")).await.unwrap();
        client.search(&request("second")).await.unwrap();

        let seen = seen.lock().unwrap();
        let creates = seen.iter().filter(|t| t.starts_with("/filters/create")).count();
        assert_eq!(creates, 1);
        let searches: Vec<&String> = seen.iter().filter(|t| t.starts_with("/search/advanced")).collect();
        assert_eq!(searches.len(), 2);
        assert!(searches.iter().all(|t| t.contains("filter=mdfilter")));
    }

    #[tokio::test]
    async fn test_failed_filter_creation_falls_back_to_withbody() {
        let (base, seen) = serve(|path, _| {
            if path == "/filters/create" {
                (500, "oops".to_string())
            } else {
                (200, r#"{"items":[]}"#.to_string())
            }
        })
        .await;

        client(&base, None).search(&request("vim")).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen
            .iter()
            .any(|t| t.starts_with("/search/advanced") && t.contains("filter=withbody")));
    }

    #[tokio::test]
    async fn test_answers_are_paged_until_has_more_clears() {
        let (base, seen) = serve(|path, query| {
            let body = match path {
                "/search/advanced" => {
                    r#"{"items":[{"question_id":1,"title":"Q","body_markdown":"q"}]}"#
                }
                "/questions/1/answers" if has_param(query, "page=1") => {
                    r#"{"items":[{"answer_id":10,"question_id":1,"body_markdown":"top"}],"has_more":true}"#
                }
                "/questions/1/answers" => {
                    r#"{"items":[{"answer_id":11,"question_id":1,"body_markdown":"later"}],"has_more":false}"#
                }
                _ => r#"{"items":[],"has_more":false}"#,
            };
            (200, body.to_string())
        })
        .await;

        let result = client(&base, Some("withbody")).search(&request("vim")).await.unwrap();
        let answers: Vec<u64> = result.items[0].answers.iter().map(|a| a.id).collect();
        assert_eq!(answers, vec![10, 11]);

        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|t| t.starts_with("/questions/1/answers")
            && has_param(t.split_once('?').map_or("", |(_, q)| q), "page=2")));
    }

    #[tokio::test]
    async fn test_more_than_a_hundred_ids_are_batched() {
        let (base, seen) = serve(|_, _| (200, r#"{"items":[],"has_more":false}"#.to_string())).await;

        let client = client(&base, Some("withbody"));
        let ids: Vec<u64> = (1..=150).collect();
        let comments: Vec<CommentDto> = client
            .children("answers", &ids, "comments", "", "withbody")
            .await
            .unwrap();
        assert!(comments.is_empty());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("/answers/1;2;"));
        assert!(seen[1].starts_with("/answers/101;"));
    }
}
