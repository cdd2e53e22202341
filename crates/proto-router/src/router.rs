//! Registration layer over [`axum::Router`] that turns typed message returns
//! into protobuf responses.
//!
//! Handlers stay ordinary async functions using ordinary axum extractors. The
//! only difference from a plain axum handler is the return type: a handler
//! registered here returns a [`Reply`] (or a `Result` whose `Ok` side is one),
//! and the router decides how to put it on the wire:
//!
//! * [`Reply::Message`] is encoded and sent with the route's content type,
//! * [`Reply::Encoded`] is sent as-is with the route's content type,
//! * [`Reply::Native`] is returned untouched (custom statuses, empty 404s, ...).
//!
//! Errors are not caught here. An `Err(e)` becomes `e.into_response()`, which
//! is the same path a plain axum handler's error would take.

use std::future::Future;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter},
    Router,
};
use prost::Message;

use crate::codec::{Payload, PROTOBUF_MEDIA_TYPE};

/// What a protobuf handler hands back to the router.
#[derive(Debug)]
pub enum Reply<M> {
    /// Typed message, encoded by the router.
    Message(M),
    /// Bytes already in wire format.
    Encoded(Bytes),
    /// Framework response, passed through unchanged.
    Native(Response),
}

impl<M> Reply<M> {
    pub fn native(response: impl IntoResponse) -> Self {
        Reply::Native(response.into_response())
    }
}

impl<M> From<M> for Reply<M> {
    fn from(message: M) -> Self {
        Reply::Message(message)
    }
}

impl<M: Message> Reply<M> {
    fn into_response_with(self, options: &RouteOptions) -> Response {
        let payload = match self {
            Reply::Message(message) => Payload::Message(message),
            Reply::Encoded(bytes) => Payload::Raw(bytes),
            Reply::Native(response) => return response,
        };
        let headers = [(header::CONTENT_TYPE, options.content_type.clone())];
        (headers, payload.into_bytes()).into_response()
    }
}

/// Return types accepted from a protobuf handler.
pub trait IntoReply {
    type Message: Message;

    fn into_reply(self) -> Reply<Self::Message>;
}

impl<M: Message> IntoReply for Reply<M> {
    type Message = M;

    fn into_reply(self) -> Reply<M> {
        self
    }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: IntoResponse,
{
    type Message = R::Message;

    fn into_reply(self) -> Reply<R::Message> {
        match self {
            Ok(reply) => reply.into_reply(),
            Err(err) => Reply::Native(err.into_response()),
        }
    }
}

/// Per-route settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOptions {
    content_type: HeaderValue,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            content_type: HeaderValue::from_static(PROTOBUF_MEDIA_TYPE),
        }
    }
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type for encoded replies on this route. `Reply::Native`
    /// responses keep their own headers regardless.
    pub fn content_type(mut self, value: HeaderValue) -> Self {
        self.content_type = value;
        self
    }

    pub fn response_content_type(&self) -> &HeaderValue {
        &self.content_type
    }
}

/// The verbs a protobuf route can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Delete => Method::DELETE,
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Put => MethodFilter::PUT,
            Verb::Delete => MethodFilter::DELETE,
        }
    }
}

/// One row of the route table, produced by each registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub method: Method,
    pub path: String,
    pub content_type: HeaderValue,
}

/// An async function that can be registered on a [`ProtoRouter`].
///
/// Implemented for `FnOnce` closures and `async fn`s taking up to eight
/// extractors, the last of which may consume the body, and returning
/// something that implements [`IntoReply`]. `T` only exists to keep the
/// per-arity impls apart.
pub trait ProtoHandler<T, S>: Clone + Send + Sized + 'static {
    /// Wraps the handler into an axum method router for `verb`. The handler
    /// value is cloned into the wrapper and stays callable on its own.
    fn into_method_router(self, verb: Verb, options: RouteOptions) -> MethodRouter<S>;
}

impl<F, Fut, R, S> ProtoHandler<((),), S> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    R: IntoReply,
    S: Clone + Send + Sync + 'static,
{
    fn into_method_router(self, verb: Verb, options: RouteOptions) -> MethodRouter<S> {
        let wrapped = move || async move { self().await.into_reply().into_response_with(&options) };
        axum::routing::on(verb.filter(), wrapped)
    }
}

macro_rules! impl_proto_handler {
    ( [$($ty:ident),*], $last:ident ) => {
        #[allow(non_snake_case)]
        impl<F, Fut, R, S, M, $($ty,)* $last> ProtoHandler<(M, $($ty,)* $last,), S> for F
        where
            F: FnOnce($($ty,)* $last,) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send,
            R: IntoReply,
            S: Clone + Send + Sync + 'static,
            M: 'static,
            $( $ty: FromRequestParts<S> + Send + 'static, )*
            $last: FromRequest<S, M> + Send + 'static,
        {
            fn into_method_router(self, verb: Verb, options: RouteOptions) -> MethodRouter<S> {
                let wrapped = move |$($ty: $ty,)* $last: $last| async move {
                    self($($ty,)* $last).await.into_reply().into_response_with(&options)
                };
                axum::routing::on(verb.filter(), wrapped)
            }
        }
    };
}

impl_proto_handler!([], T1);
impl_proto_handler!([T1], T2);
impl_proto_handler!([T1, T2], T3);
impl_proto_handler!([T1, T2, T3], T4);
impl_proto_handler!([T1, T2, T3, T4], T5);
impl_proto_handler!([T1, T2, T3, T4, T5], T6);
impl_proto_handler!([T1, T2, T3, T4, T5, T6], T7);
impl_proto_handler!([T1, T2, T3, T4, T5, T6, T7], T8);

/// Wrapper around [`axum::Router`] whose `get`/`post`/`put`/`delete` accept
/// [`ProtoHandler`]s.
///
/// Besides the protobuf registrations it forwards exactly these operations to
/// the inner router: [`route_native`](Self::route_native),
/// [`merge_native`](Self::merge_native), [`with_state`](Self::with_state) and
/// [`into_router`](Self::into_router). The route table is fixed once the
/// router is converted; nothing can be added while serving.
pub struct ProtoRouter<S = ()> {
    inner: Router<S>,
    routes: Vec<RouteRecord>,
}

impl<S> Default for ProtoRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ProtoRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Router::new(),
            routes: Vec::new(),
        }
    }

    /// Registers `handler` at `(verb, path)` with explicit options.
    ///
    /// Panics on the same conditions as [`Router::route`], e.g. registering
    /// one verb twice for a path.
    pub fn on<H, T>(mut self, verb: Verb, path: &str, options: RouteOptions, handler: H) -> Self
    where
        H: ProtoHandler<T, S>,
        T: 'static,
    {
        tracing::debug!(method = %verb.method(), path, "registering protobuf route");
        self.routes.push(RouteRecord {
            method: verb.method(),
            path: path.to_string(),
            content_type: options.response_content_type().clone(),
        });
        self.inner = self
            .inner
            .route(path, handler.into_method_router(verb, options));
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: ProtoHandler<T, S>,
        T: 'static,
    {
        self.on(Verb::Get, path, RouteOptions::default(), handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: ProtoHandler<T, S>,
        T: 'static,
    {
        self.on(Verb::Post, path, RouteOptions::default(), handler)
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: ProtoHandler<T, S>,
        T: 'static,
    {
        self.on(Verb::Put, path, RouteOptions::default(), handler)
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: ProtoHandler<T, S>,
        T: 'static,
    {
        self.on(Verb::Delete, path, RouteOptions::default(), handler)
    }

    /// Mounts a plain axum method router (HTML pages, health checks, ...).
    /// Not recorded in [`routes`](Self::routes).
    pub fn route_native(mut self, path: &str, method_router: MethodRouter<S>) -> Self {
        self.inner = self.inner.route(path, method_router);
        self
    }

    /// Merges a plain axum router. Not recorded in [`routes`](Self::routes).
    pub fn merge_native<R>(mut self, other: R) -> Self
    where
        R: Into<Router<S>>,
    {
        self.inner = self.inner.merge(other);
        self
    }

    /// Protobuf routes registered so far, in registration order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn with_state<S2>(self, state: S) -> Router<S2> {
        self.inner.with_state(state)
    }

    pub fn into_router(self) -> Router<S> {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, extract::ProtoBody};
    use axum::{
        body::{self, Body},
        extract::{Path, State},
        http::{Request, StatusCode},
        routing::get,
    };
    use todo_proto::{ApiResponse, CreateTodoRequest, TodoList};
    use tower::ServiceExt; // for `oneshot`

    #[derive(Debug)]
    struct Missing;

    impl IntoResponse for Missing {
        fn into_response(self) -> Response {
            StatusCode::NOT_FOUND.into_response()
        }
    }

    async fn list() -> Reply<TodoList> {
        TodoList::default().into()
    }

    async fn create(ProtoBody(req): ProtoBody<CreateTodoRequest>) -> Reply<ApiResponse> {
        ApiResponse::ok(format!("created {}", req.title)).into()
    }

    async fn lookup(Path(id): Path<i64>) -> Result<Reply<ApiResponse>, Missing> {
        if id == 1 {
            Ok(ApiResponse::ok("found").into())
        } else {
            Err(Missing)
        }
    }

    async fn teapot() -> Reply<ApiResponse> {
        Reply::native((StatusCode::IM_A_TEAPOT, "short and stout"))
    }

    async fn pre_encoded() -> Reply<ApiResponse> {
        Reply::Encoded(codec::encode(&ApiResponse::ok("cached")))
    }

    async fn greet(State(greeting): State<&'static str>, Path(name): Path<String>) -> Reply<ApiResponse> {
        ApiResponse::ok(format!("{greeting}, {name}")).into()
    }

    async fn call(router: Router, method: &str, uri: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Bytes {
        body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    fn content_type(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn message_replies_are_encoded_as_protobuf() {
        let router = ProtoRouter::new().post("/todos", create).into_router();
        let body = CreateTodoRequest { title: "milk".into() }.encode_to_vec();

        let response = call(router, "POST", "/todos", body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), Some(PROTOBUF_MEDIA_TYPE));

        let decoded: ApiResponse = codec::decode(&body_bytes(response).await).unwrap();
        assert_eq!(decoded.message, "created milk");
        assert!(decoded.success);
    }

    #[tokio::test]
    async fn zero_argument_handlers_are_supported() {
        let router = ProtoRouter::new().get("/todos", list).into_router();
        let response = call(router, "GET", "/todos", Vec::new()).await;
        assert_eq!(content_type(&response), Some(PROTOBUF_MEDIA_TYPE));
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn native_responses_pass_through_unchanged() {
        let router = ProtoRouter::new().get("/teapot", teapot).into_router();
        let response = call(router, "GET", "/teapot", Vec::new()).await;
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_ne!(content_type(&response), Some(PROTOBUF_MEDIA_TYPE));
        assert_eq!(body_bytes(response).await, "short and stout");
    }

    #[tokio::test]
    async fn errors_take_the_framework_path() {
        let router = ProtoRouter::new().get("/todos/:id", lookup).into_router();

        let found = call(router.clone(), "GET", "/todos/1", Vec::new()).await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(content_type(&found), Some(PROTOBUF_MEDIA_TYPE));

        let missing = call(router, "GET", "/todos/2", Vec::new()).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(content_type(&missing).is_none());
        assert!(body_bytes(missing).await.is_empty());
    }

    #[tokio::test]
    async fn decode_failures_never_reach_the_handler() {
        let router = ProtoRouter::new().post("/todos", create).into_router();
        let response = call(router, "POST", "/todos", vec![0x0a, 0x10, b'x']).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pre_encoded_bytes_are_sent_verbatim() {
        let router = ProtoRouter::new().get("/cached", pre_encoded).into_router();
        let response = call(router, "GET", "/cached", Vec::new()).await;
        assert_eq!(content_type(&response), Some(PROTOBUF_MEDIA_TYPE));
        assert_eq!(body_bytes(response).await, codec::encode(&ApiResponse::ok("cached")));
    }

    #[tokio::test]
    async fn content_type_can_be_overridden_per_route() {
        let options = RouteOptions::new().content_type(HeaderValue::from_static("application/octet-stream"));
        let router = ProtoRouter::new()
            .on(Verb::Get, "/raw", options, list)
            .get("/todos", list)
            .into_router();

        let raw = call(router.clone(), "GET", "/raw", Vec::new()).await;
        assert_eq!(content_type(&raw), Some("application/octet-stream"));
        let default = call(router, "GET", "/todos", Vec::new()).await;
        assert_eq!(content_type(&default), Some(PROTOBUF_MEDIA_TYPE));
    }

    #[tokio::test]
    async fn state_and_path_extractors_are_forwarded() {
        let router: Router = ProtoRouter::new()
            .get("/greet/:name", greet)
            .with_state("hello");
        let response = call(router, "GET", "/greet/ada", Vec::new()).await;
        let decoded: ApiResponse = codec::decode(&body_bytes(response).await).unwrap();
        assert_eq!(decoded.message, "hello, ada");
    }

    #[tokio::test]
    async fn native_routes_share_paths_with_protobuf_routes() {
        let router = ProtoRouter::new()
            .get("/todos", list)
            .route_native("/todos", axum::routing::post(|| async { "html" }))
            .merge_native(Router::<()>::new().route("/health", get(|| async { "ok" })))
            .into_router();

        let html = call(router.clone(), "POST", "/todos", Vec::new()).await;
        assert_eq!(body_bytes(html).await, "html");
        let health = call(router.clone(), "GET", "/health", Vec::new()).await;
        assert_eq!(health.status(), StatusCode::OK);
        let proto = call(router, "GET", "/todos", Vec::new()).await;
        assert_eq!(content_type(&proto), Some(PROTOBUF_MEDIA_TYPE));
    }

    #[test]
    fn registrations_are_recorded_in_order() {
        let router: ProtoRouter = ProtoRouter::new()
            .get("/todos", list)
            .post("/todos", create)
            .put("/todos/:id", lookup)
            .delete("/todos/:id", lookup);
        let table: Vec<(Method, &str)> = router
            .routes()
            .iter()
            .map(|r| (r.method.clone(), r.path.as_str()))
            .collect();
        assert_eq!(
            table,
            vec![
                (Method::GET, "/todos"),
                (Method::POST, "/todos"),
                (Method::PUT, "/todos/:id"),
                (Method::DELETE, "/todos/:id"),
            ]
        );
        assert!(router.routes().iter().all(|r| r.content_type == PROTOBUF_MEDIA_TYPE));
    }

    #[tokio::test]
    async fn wrapped_handlers_stay_callable_directly() {
        let _router: ProtoRouter = ProtoRouter::new().post("/todos", create);
        let reply = create(ProtoBody(CreateTodoRequest { title: "direct".into() })).await;
        match reply {
            Reply::Message(resp) => assert_eq!(resp.message, "created direct"),
            other => panic!("expected a message reply, got {other:?}"),
        }
    }
}
