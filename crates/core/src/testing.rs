//! Scripted collaborators shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::ingest::{
    CandidateMeta, ExtractError, ExtractionInput, ExtractionRequest, Extractor,
    MailboxCredential, MailboxProvider, MessageBody, MessagePage, ProviderError, TokenRefresher,
};
use crate::notify::{Notification, Notifier, NotifyError};

/// Mailbox with scripted pages and messages.
#[derive(Default)]
pub struct FakeMailbox {
    pages: Mutex<Vec<Vec<String>>>,
    messages: Mutex<HashMap<String, MessageBody>>,
    broken: Mutex<HashSet<String>>,
    queries: Mutex<Vec<String>>,
    tokens: Mutex<Vec<String>>,
    fail_listing: AtomicBool,
    reject_token: Mutex<Option<String>>,
}

impl FakeMailbox {
    pub fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        let mailbox = Self::default();
        *mailbox.pages.lock().unwrap() = pages
            .into_iter()
            .map(|page| page.into_iter().map(str::to_string).collect())
            .collect();
        mailbox
    }

    pub fn add_message(&self, id: &str, subject: &str, text: &str) {
        self.messages.lock().unwrap().insert(
            id.to_string(),
            MessageBody {
                message_id: id.to_string(),
                subject: subject.to_string(),
                text: text.to_string(),
                received_at: Some("2024-03-12T10:00:00Z".parse().unwrap()),
            },
        );
    }

    /// Fetches of this id fail with a provider error.
    pub fn break_message(&self, id: &str) {
        self.broken.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Calls with this access token are refused.
    pub fn reject_token(&self, token: &str) {
        *self.reject_token.lock().unwrap() = Some(token.to_string());
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    fn check(&self, credential: &MailboxCredential) -> Result<(), ProviderError> {
        self.tokens
            .lock()
            .unwrap()
            .push(credential.access_token.clone());
        if self.reject_token.lock().unwrap().as_deref() == Some(credential.access_token.as_str()) {
            return Err(ProviderError::Unauthorized("token revoked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MailboxProvider for FakeMailbox {
    async fn list_messages(
        &self,
        credential: &MailboxCredential,
        query: &str,
        page_token: Option<&str>,
        _max_results: u32,
    ) -> Result<MessagePage, ProviderError> {
        self.check(credential)?;
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ProviderError::Http {
                status: 500,
                message: "backend error".to_string(),
            });
        }

        let pages = self.pages.lock().unwrap();
        let index: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let message_ids = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
        Ok(MessagePage {
            message_ids,
            next_page_token,
        })
    }

    async fn get_metadata(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<CandidateMeta, ProviderError> {
        let message = self.get_message(credential, message_id).await?;
        Ok(CandidateMeta {
            message_id: message.message_id,
            subject: message.subject,
            snippet: message.text.chars().take(40).collect(),
            sender: Some("alerts@bank.example".to_string()),
            received_at: message.received_at,
        })
    }

    async fn get_message(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<MessageBody, ProviderError> {
        self.check(credential)?;
        if self.broken.lock().unwrap().contains(message_id) {
            return Err(ProviderError::Http {
                status: 404,
                message: format!("message {message_id} not found"),
            });
        }
        self.messages
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| ProviderError::Decode(format!("no message {message_id}")))
    }
}

/// Extractor answering by substring match on the input text.
#[derive(Default)]
pub struct FakeExtractor {
    replies: Mutex<Vec<(String, String)>>,
    image_reply: Mutex<Option<String>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeExtractor {
    /// Texts containing `marker` get `reply`. Later replies win.
    pub fn reply(&self, marker: &str, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(0, (marker.to_string(), reply.to_string()));
    }

    pub fn reply_to_images(&self, reply: &str) {
        *self.image_reply.lock().unwrap() = Some(reply.to_string());
    }

    /// Texts containing `marker` fail.
    pub fn fail_on(&self, marker: &str) {
        self.failing.lock().unwrap().insert(marker.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &request.input {
            ExtractionInput::Image { .. } => Ok(self
                .image_reply
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "null".to_string())),
            ExtractionInput::Text(text) => {
                if self.failing.lock().unwrap().iter().any(|m| text.contains(m)) {
                    return Err(ExtractError::Service("model overloaded".to_string()));
                }
                Ok(self
                    .replies
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|(marker, _)| text.contains(marker))
                    .map_or_else(|| "null".to_string(), |(_, reply)| reply.clone()))
            }
        }
    }
}

/// Refresher minting "fresh-N" tokens without returning a refresh token.
#[derive(Default)]
pub struct FakeRefresher {
    calls: AtomicUsize,
    refuse: AtomicBool,
}

impl FakeRefresher {
    pub fn refuse(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(
        &self,
        _credential: &MailboxCredential,
    ) -> Result<MailboxCredential, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ProviderError::Unauthorized("invalid_grant".to_string()));
        }
        Ok(MailboxCredential {
            access_token: format!("fresh-{n}"),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }
}

/// Credential valid for an hour past `now`.
pub fn live_credential(now: DateTime<Utc>) -> MailboxCredential {
    MailboxCredential {
        access_token: "live".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: Some(now + Duration::hours(1)),
    }
}

/// Notifier that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("webhook returned 500".to_string()));
        }
        Ok(())
    }
}
