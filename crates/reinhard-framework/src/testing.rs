//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::{Context, TriggerKind};
use reinhard_core::{
    EntityCache, EntityRest, Member, Message, NoCache, OutgoingMessage, ReplyError, ReplyResult,
    ReplySink, RestError, RestResult, Role, Services, Snowflake, User,
};

pub(crate) const BOT_ID: u64 = 1000;
pub(crate) const AUTHOR_ID: u64 = 42;
pub(crate) const CHANNEL_ID: u64 = 7;
pub(crate) const GUILD_ID: u64 = 500;

pub(crate) fn message(guild_id: Option<u64>, content: &str) -> Message {
    Message::new(
        1,
        CHANNEL_ID,
        guild_id.map(Snowflake),
        User::new(AUTHOR_ID, "author"),
        content,
    )
}

pub(crate) fn services() -> (Arc<Services>, Arc<RecordingReplies>) {
    let replies = Arc::new(RecordingReplies::default());
    (services_with_replies(Arc::clone(&replies)), replies)
}

pub(crate) fn services_with_replies(replies: Arc<RecordingReplies>) -> Arc<Services> {
    Arc::new(Services::new(Arc::new(MockRest::default()), replies))
}

pub(crate) fn services_with_rest(
    rest: Arc<MockRest>,
    cache: Arc<dyn EntityCache>,
) -> Arc<Services> {
    Arc::new(
        Services::new(rest, Arc::new(RecordingReplies::default())).with_cache(cache),
    )
}

pub(crate) fn guild_context(services: Arc<Services>, guild_id: Option<u64>) -> Context {
    Context::new(
        Arc::new(message(guild_id, "!cmd")),
        "",
        "!",
        TriggerKind::Prefix,
        services,
    )
}

pub(crate) fn no_cache() -> Arc<dyn EntityCache> {
    Arc::new(NoCache)
}

// =============================================================================
// Replies
// =============================================================================

#[derive(Default)]
pub(crate) struct RecordingReplies {
    sent: Mutex<Vec<(Snowflake, OutgoingMessage)>>,
    failure: Option<ReplyError>,
}

impl RecordingReplies {
    pub(crate) fn failing(error: ReplyError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    pub(crate) fn sent(&self) -> Vec<(Snowflake, OutgoingMessage)> {
        self.sent.lock().clone()
    }

    pub(crate) fn contents(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|(_, message)| message.content.clone())
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingReplies {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: OutgoingMessage,
    ) -> ReplyResult<Message> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let content = message.content.clone().unwrap_or_default();
        self.sent.lock().push((channel_id, message));
        Ok(Message::new(
            2,
            channel_id,
            None,
            User::new(BOT_ID, "reinhard"),
            content,
        ))
    }
}

// =============================================================================
// REST
// =============================================================================

/// Scripted REST client. Unscripted calls fail with a transport error.
#[derive(Default)]
pub(crate) struct MockRest {
    pub(crate) member_calls: AtomicU32,
    pub(crate) search_calls: AtomicU32,
    pub(crate) roles_calls: AtomicU32,
    pub(crate) user_calls: AtomicU32,
    member: Mutex<VecDeque<RestResult<Member>>>,
    search: Mutex<VecDeque<RestResult<Vec<Member>>>>,
    roles: Mutex<VecDeque<RestResult<Vec<Role>>>>,
    user: Mutex<VecDeque<RestResult<User>>>,
}

impl MockRest {
    pub(crate) fn with_member(self, result: RestResult<Member>) -> Self {
        self.member.lock().push_back(result);
        self
    }

    pub(crate) fn with_search(self, result: RestResult<Vec<Member>>) -> Self {
        self.search.lock().push_back(result);
        self
    }

    pub(crate) fn with_roles(self, result: RestResult<Vec<Role>>) -> Self {
        self.roles.lock().push_back(result);
        self
    }

    pub(crate) fn with_user(self, result: RestResult<User>) -> Self {
        self.user.lock().push_back(result);
        self
    }

    pub(crate) fn calls(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

fn next<T>(script: &Mutex<VecDeque<RestResult<T>>>) -> RestResult<T> {
    script
        .lock()
        .pop_front()
        .unwrap_or_else(|| Err(RestError::Transport("connection reset".into())))
}

#[async_trait]
impl EntityRest for MockRest {
    async fn fetch_member(&self, _guild_id: Snowflake, _user_id: Snowflake) -> RestResult<Member> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.member)
    }

    async fn search_members(&self, _guild_id: Snowflake, _query: &str) -> RestResult<Vec<Member>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.search)
    }

    async fn fetch_roles(&self, _guild_id: Snowflake) -> RestResult<Vec<Role>> {
        self.roles_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.roles)
    }

    async fn fetch_user(&self, _user_id: Snowflake) -> RestResult<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.user)
    }
}
