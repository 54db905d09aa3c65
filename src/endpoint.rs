//! The request/response surface a participant exposes to its peers and to
//! whoever drives the run. It is transport agnostic: an HTTP server (or a
//! test harness) turns its requests into [`Request`]s and writes the
//! [`Response`] back.

use http::{Method, StatusCode};
use log::{debug, warn};

use crate::{
    Coin, DeliveryError, Error, NodeId, Participant, ParticipantState, Result, Transport, Vote,
    VoteResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Status,
    GetState,
    Message(Vote),
    Start,
    Stop,
}

impl Request {
    /// Maps `GET /status`, `GET /getState`, `POST /message`, `GET /start` and `GET /stop`.
    pub fn route(method: &Method, path: &str, body: &[u8]) -> Result<Self> {
        let request = match path {
            "/status" if *method == Method::GET => Request::Status,
            "/getState" if *method == Method::GET => Request::GetState,
            "/message" if *method == Method::POST => Request::Message(Vote::from_json(body)?),
            "/start" if *method == Method::GET => Request::Start,
            "/stop" if *method == Method::GET => Request::Stop,
            _ => {
                return Err(Error::UnknownRoute {
                    method: method.as_str().to_string(),
                    path: path.to_string(),
                })
            }
        };
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    State(ParticipantState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Body,
}

impl Response {
    fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            status,
            body: Body::Text(text.into()),
        }
    }

    fn ok(text: impl Into<String>) -> Self {
        Self::text(StatusCode::OK, text)
    }

    fn rejection(err: &Error) -> Self {
        match err {
            Error::Faulty => Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Node is faulty"),
            Error::Killed => Self::text(StatusCode::GONE, "Node is stopped"),
            Error::AlreadyStarted => {
                Self::text(StatusCode::CONFLICT, "Consensus process already started")
            }
            Error::UnknownRoute { .. } => Self::text(StatusCode::NOT_FOUND, err.to_string()),
            _ => Self::text(StatusCode::BAD_REQUEST, err.to_string()),
        }
    }

    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            Body::Text(text) => Ok(text.clone().into_bytes()),
            Body::State(state) => Ok(serde_json::to_vec(state)?),
        }
    }
}

/// One participant behind its request/response surface.
///
/// Requests are handled one at a time to completion; any votes the
/// participant cast while handling one are dispatched before the response
/// is returned.
#[derive(Debug)]
pub struct Endpoint<C: Coin> {
    participant: Participant<C>,
    delivery_failures: Vec<DeliveryError>,
}

impl<C: Coin> Endpoint<C> {
    pub fn new(participant: Participant<C>) -> Self {
        Self {
            participant,
            delivery_failures: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.participant.id()
    }

    pub fn participant(&self) -> &Participant<C> {
        &self.participant
    }

    /// Deliveries that failed during the most recent broadcast.
    pub fn delivery_failures(&self) -> &[DeliveryError] {
        &self.delivery_failures
    }

    /// Routes a raw request; malformed ones are answered rather than propagated.
    pub fn handle_raw(
        &mut self,
        method: &Method,
        path: &str,
        body: &[u8],
        transport: &mut impl Transport,
    ) -> Response {
        match Request::route(method, path, body) {
            Ok(request) => self.handle(request, transport),
            Err(err) => {
                warn!("[BO-{}] bad request {} {}: {}", self.id(), method, path, err);
                Response::rejection(&err)
            }
        }
    }

    pub fn handle(&mut self, request: Request, transport: &mut impl Transport) -> Response {
        debug!("[BO-{}] handling {:?}", self.id(), request);
        let resp = match request {
            Request::Status => match self.participant.status() {
                Ok(()) => Response::ok("live"),
                Err(_) => Response::text(StatusCode::INTERNAL_SERVER_ERROR, "faulty"),
            },
            Request::GetState => Response {
                status: StatusCode::OK,
                body: Body::State(self.participant.state()),
            },
            Request::Message(vote) => {
                let outcome = self.participant.receive_vote(vote);
                self.respond(outcome, "Vote received", transport)
            }
            Request::Start => {
                let outcome = self.participant.start();
                self.respond(outcome, "Consensus process started", transport)
            }
            Request::Stop => {
                self.participant.stop();
                Response::ok("Node stopped")
            }
        };
        debug!("[BO-{}] responding {:?}", self.id(), resp);
        resp
    }

    fn respond(
        &mut self,
        outcome: Result<VoteResponse>,
        accepted: &str,
        transport: &mut impl Transport,
    ) -> Response {
        match outcome {
            Ok(_) => {
                // Failed deliveries do not change what we answer.
                self.delivery_failures = self.participant.broadcaster_mut().dispatch(transport);
                Response::ok(accepted)
            }
            Err(err) => Response::rejection(&err),
        }
    }
}
