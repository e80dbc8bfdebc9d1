//! Route tables: method names to handler factories.
//!
//! A route table hands out a fresh [`HandlerResolution`] per request, so
//! action state can never leak between requests. The registry variant here
//! covers static deployments; projects that load handlers dynamically
//! implement [`RouteTable`] themselves.

use indexmap::IndexMap;

use talaria_core::HandlerResolution;

/// Builds a fresh handler pair for one request.
pub type HandlerFactory = Box<dyn Fn() -> HandlerResolution + Send + Sync>;

/// Resolves sanitized method names to handler pairs.
pub trait RouteTable: Send + Sync {
    /// Resolves the method name, building a fresh handler pair.
    ///
    /// `None` means the method is not loaded; the dispatcher turns that
    /// into the routing error response.
    fn resolve(&self, method_name: &str) -> Option<HandlerResolution>;
}

/// A fixed, registration-time route table.
///
/// # Example
///
/// ```ignore
/// let routes = StaticRouteTable::new()
///     .route("user/list", || HandlerResolution {
///         initializer: Initializer::new().verb(Method::GET),
///         action: Box::new(ListUsers),
///     });
/// ```
#[derive(Default)]
pub struct StaticRouteTable {
    factories: IndexMap<String, HandlerFactory>,
}

impl StaticRouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler factory under a method name.
    #[must_use]
    pub fn route(
        mut self,
        method_name: impl Into<String>,
        factory: impl Fn() -> HandlerResolution + Send + Sync + 'static,
    ) -> Self {
        self.factories.insert(method_name.into(), Box::new(factory));
        self
    }

    /// The registered method names, in registration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl RouteTable for StaticRouteTable {
    fn resolve(&self, method_name: &str) -> Option<HandlerResolution> {
        self.factories.get(method_name).map(|factory| factory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http::Method;
    use serde_json::{json, Value};
    use talaria_core::{Action, ActionContext, ActionReply, DispatchResult, Initializer};

    struct Counter {
        calls: u32,
    }

    #[async_trait]
    impl Action for Counter {
        async fn execute(&mut self, _ctx: &ActionContext) -> DispatchResult<ActionReply> {
            self.calls += 1;
            Ok(ActionReply::ok(json!({ "calls": self.calls })))
        }
    }

    fn table() -> StaticRouteTable {
        StaticRouteTable::new().route("counter/bump", || HandlerResolution {
            initializer: Initializer::new().verb(Method::POST),
            action: Box::new(Counter { calls: 0 }),
        })
    }

    #[test]
    fn test_unknown_method_is_none() {
        assert!(table().resolve("counter/missing").is_none());
    }

    #[tokio::test]
    async fn test_each_resolution_is_fresh() {
        let table = table();
        let ctx = ActionContext::default();

        let mut first = table.resolve("counter/bump").unwrap();
        let reply = first.action.execute(&ctx).await.unwrap();
        assert_eq!(reply.data["calls"], 1);

        // A second resolution must not see the first action's state.
        let mut second = table.resolve("counter/bump").unwrap();
        let reply = second.action.execute(&ctx).await.unwrap();
        assert_eq!(reply.data["calls"], 1);
        assert_ne!(reply.data, Value::Null);
    }
}
