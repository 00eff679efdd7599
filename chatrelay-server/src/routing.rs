//! Destination routing for `send` frames.
//!
//! A route binds an inbound pattern such as `/sendMessage/{roomId}` to a handler and
//! to a `send_to` topic template. Path variables captured from the inbound
//! destination are fed to both, so `/sendMessage/r1` publishes on `/topic/room/r1`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::RelayError;
use crate::AppState;

pub type PathVars = HashMap<String, String>;
pub type HandlerFuture = BoxFuture<'static, Result<Value, RelayError>>;
pub type Handler = Arc<dyn Fn(Arc<AppState>, PathVars, Value) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl DestinationPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .trim_start_matches('/')
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Var(name.to_string()),
                None => Segment::Literal(seg.to_string()),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path variables if `destination` matches; variables never capture an empty segment.
    pub fn matches(&self, destination: &str) -> Option<PathVars> {
        let rest = destination.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut vars = PathVars::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Var(_) if part.is_empty() => return None,
                Segment::Var(name) => {
                    vars.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(vars)
    }

    /// Fills the template from `vars`. A variable missing from `vars` is left as `{name}`.
    pub fn expand(&self, vars: &PathVars) -> String {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Var(name) => match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

struct Route {
    pattern: DestinationPattern,
    send_to: DestinationPattern,
    handler: Handler,
}

/// Result of a routed `send`: what to publish and where.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub topic: String,
    pub payload: Value,
}

/// Handler-registration table for inbound destinations.
pub struct DestinationRouter {
    prefix: Option<String>,
    routes: Vec<Route>,
}

impl DestinationRouter {
    /// `prefix` (e.g. `/app`) is stripped from inbound destinations when present.
    /// An empty prefix disables stripping.
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            routes: Vec::new(),
        }
    }

    /// Registers `f` for `pattern`; its result is published on `send_to`.
    /// The send body is decoded into `B` before the handler runs.
    pub fn route<F, Fut, B, R>(mut self, pattern: &str, send_to: &str, f: F) -> Self
    where
        F: Fn(Arc<AppState>, PathVars, B) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RelayError>> + Send + 'static,
        B: DeserializeOwned + 'static,
        R: Serialize + Send + 'static,
    {
        let handler: Handler = Arc::new(move |state: Arc<AppState>, vars: PathVars, body: Value| -> HandlerFuture {
            let input = match serde_json::from_value::<B>(body) {
                Ok(input) => input,
                Err(e) => return Box::pin(future::ready(Err(RelayError::InvalidPayload(e)))),
            };
            let fut = f(state, vars, input);
            Box::pin(async move {
                let out = fut.await?;
                serde_json::to_value(out).map_err(RelayError::Encode)
            })
        });
        self.routes.push(Route {
            pattern: DestinationPattern::parse(pattern),
            send_to: DestinationPattern::parse(send_to),
            handler,
        });
        self
    }

    pub fn strip_prefix<'a>(&self, destination: &'a str) -> &'a str {
        match &self.prefix {
            Some(prefix) => match destination.strip_prefix(prefix.as_str()) {
                Some(rest) if rest.starts_with('/') => rest,
                _ => destination,
            },
            None => destination,
        }
    }

    /// Routes a `send` body and returns the handler's value with its target topic.
    pub async fn dispatch(
        &self,
        state: Arc<AppState>,
        destination: &str,
        body: Value,
    ) -> Result<Dispatched, RelayError> {
        let local = self.strip_prefix(destination);
        let (route, vars) = self
            .routes
            .iter()
            .find_map(|route| route.pattern.matches(local).map(|vars| (route, vars)))
            .ok_or_else(|| RelayError::UnknownDestination(destination.to_string()))?;

        let topic = route.send_to.expand(&vars);
        tracing::debug!(destination, pattern = route.pattern.as_str(), topic = %topic, "routing send");

        let payload = (route.handler)(state, vars, body).await?;
        Ok(Dispatched { topic, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> PathVars {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn pattern_captures_path_variables() {
        let p = DestinationPattern::parse("/sendMessage/{roomId}");
        assert_eq!(p.matches("/sendMessage/room-42"), Some(vars(&[("roomId", "room-42")])));
    }

    #[test]
    fn pattern_rejects_other_shapes() {
        let p = DestinationPattern::parse("/sendMessage/{roomId}");
        assert_eq!(p.matches("/sendMessage/"), None);
        assert_eq!(p.matches("/sendMessage"), None);
        assert_eq!(p.matches("/sendMessage/a/b"), None);
        assert_eq!(p.matches("/sendMessage/a/"), None);
        assert_eq!(p.matches("/send/a"), None);
        assert_eq!(p.matches("sendMessage/a"), None);
    }

    #[test]
    fn expand_fills_known_and_keeps_unknown_variables() {
        let topic = DestinationPattern::parse("/topic/room/{roomId}");
        assert_eq!(topic.expand(&vars(&[("roomId", "r1")])), "/topic/room/r1");
        assert_eq!(topic.expand(&PathVars::new()), "/topic/room/{roomId}");
    }

    #[test]
    fn prefix_is_stripped_only_on_segment_boundary() {
        let router = DestinationRouter::new("/app/");
        assert_eq!(router.strip_prefix("/app/sendMessage/r1"), "/sendMessage/r1");
        assert_eq!(router.strip_prefix("/sendMessage/r1"), "/sendMessage/r1");
        assert_eq!(router.strip_prefix("/application/x"), "/application/x");
        assert_eq!(router.strip_prefix("/app"), "/app");

        let bare = DestinationRouter::new("");
        assert_eq!(bare.strip_prefix("/app/sendMessage/r1"), "/app/sendMessage/r1");
    }
}
