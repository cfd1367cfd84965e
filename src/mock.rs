use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use bytes::Bytes;

use crate::adapter::{RestError, RestFuture, RestRequest, RestResponse, RestResult, RestTransport};

/// One scripted outcome for the next request.
#[derive(Clone, Debug)]
pub enum MockReply {
    Respond { status: u16, body: Bytes },
    ConnectRefused(String),
    SendFailed(String),
    ReceiveFailed(String),
}

impl MockReply {
    pub fn respond(status: u16, body: impl Into<Bytes>) -> Self {
        Self::Respond {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    replies: VecDeque<MockReply>,
    sent: Vec<RestRequest>,
}

/// In-memory transport that plays back queued replies in order and records
/// every request. An empty queue answers `200` with an empty body.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    ledger: Arc<Mutex<Ledger>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: MockReply) -> &Self {
        self.ledger
            .lock()
            .expect("mock transport ledger poisoned")
            .replies
            .push_back(reply);
        self
    }

    pub fn sent(&self) -> Vec<RestRequest> {
        self.ledger
            .lock()
            .expect("mock transport ledger poisoned")
            .sent
            .clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.ledger
            .lock()
            .expect("mock transport ledger poisoned")
            .replies
            .len()
    }
}

impl RestTransport for MockTransport {
    fn execute(&self, request: RestRequest) -> RestFuture<RestResult<RestResponse>> {
        let ledger = Arc::clone(&self.ledger);
        Box::pin(async move {
            let reply = {
                let mut ledger = ledger.lock().expect("mock transport ledger poisoned");
                ledger.sent.push(request.clone());
                ledger.replies.pop_front()
            };
            let url = request.url;
            match reply {
                None => Ok(RestResponse {
                    status: 200,
                    body: Bytes::new(),
                }),
                Some(MockReply::Respond { status, body }) => Ok(RestResponse { status, body }),
                Some(MockReply::ConnectRefused(message)) => Err(RestError::Connect { url, message }),
                Some(MockReply::SendFailed(message)) => Err(RestError::Send { url, message }),
                Some(MockReply::ReceiveFailed(message)) => Err(RestError::Receive { url, message }),
            }
        })
    }
}
