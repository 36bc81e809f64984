use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};

use crate::api::{
    AuthToken, Comment, CommentId, CommentPage, CommentService, EditComment, Error, NewComment,
    PageRequest, Report, VoteDirection, VoteRequest, VoteTally,
};

/// `CommentService` over the REST API of a remote server
pub struct HttpCommentService {
    client: reqwest::Client,
    host: String,
    token: Option<AuthToken>,
}

fn network_error(e: reqwest::Error) -> Error {
    match e.is_timeout() {
        true => Error::Timeout,
        false => Error::Network(e.to_string()),
    }
}

impl HttpCommentService {
    pub fn new(host: String, token: Option<AuthToken>) -> HttpCommentService {
        HttpCommentService::with_client(reqwest::Client::new(), host, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        host: String,
        token: Option<AuthToken>,
    ) -> HttpCommentService {
        HttpCommentService {
            client,
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(tok) => req.bearer_auth(tok.0),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, Error> {
        let resp = self.authed(req).send().await.map_err(network_error)?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(network_error)?;
        Err(Error::parse(&body).unwrap_or_else(|e| {
            tracing::debug!(?e, status, "response body is not an api error");
            Error::from_status(status, String::from_utf8_lossy(&body).into_owned())
        }))
    }

    async fn send_json<R>(&self, req: RequestBuilder) -> Result<R, Error>
    where
        R: for<'de> serde::Deserialize<'de>,
    {
        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| Error::Unknown(format!("failed to parse server response: {e}")))
    }
}

#[async_trait]
impl CommentService for HttpCommentService {
    async fn list_comments(&self, req: PageRequest) -> Result<CommentPage, Error> {
        let query = [
            ("page", req.page.to_string()),
            ("page_size", req.page_size.to_string()),
            ("sort", req.sort.to_string()),
        ];
        self.send_json(
            self.client
                .get(self.url(&format!("articles/{}/comments", req.article_id.0)))
                .query(&query),
        )
        .await
    }

    async fn create_comment(&self, c: NewComment) -> Result<Comment, Error> {
        self.send_json(
            self.client
                .post(self.url(&format!("articles/{}/comments", c.article_id.0)))
                .json(&c),
        )
        .await
    }

    async fn edit_comment(&self, id: CommentId, content: String) -> Result<Comment, Error> {
        self.send_json(
            self.client
                .put(self.url(&format!("comments/{}", id.0)))
                .json(&EditComment { content }),
        )
        .await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.send(self.client.delete(self.url(&format!("comments/{}", id.0))))
            .await?;
        Ok(())
    }

    async fn vote(&self, id: CommentId, direction: VoteDirection) -> Result<VoteTally, Error> {
        self.send_json(
            self.client
                .post(self.url(&format!("comments/{}/vote", id.0)))
                .json(&VoteRequest { direction }),
        )
        .await
    }

    async fn report(&self, id: CommentId, reason: String) -> Result<(), Error> {
        self.send(
            self.client
                .post(self.url(&format!("comments/{}/report", id.0)))
                .json(&Report { reason }),
        )
        .await?;
        Ok(())
    }
}
