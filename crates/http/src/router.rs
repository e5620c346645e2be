//! Router builder for the shelf HTTP server

use axum::{extract::Request, http::HeaderValue, routing::get, Router};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::Uuid;

use shelf_kernel::ModuleRegistry;

/// Generates time-ordered request ids for the `x-request-id` header
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::now_v7().to_string().parse::<HeaderValue>().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// Join the configured API prefix and a module name into a mount path.
///
/// `("", "books")` and `("/api/", "books")` give `/books` and `/api/books`.
pub fn mount_path(api_prefix: &str, module_name: &str) -> String {
    let prefix = api_prefix.trim_end_matches('/');
    if prefix.is_empty() || prefix.starts_with('/') {
        format!("{}/{}", prefix, module_name)
    } else {
        format!("/{}/{}", prefix, module_name)
    }
}

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
    api_prefix: String,
}

impl RouterBuilder {
    /// Create a new router builder mounting modules directly under `/`
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    /// Create a new router builder mounting modules under `api_prefix`
    pub fn with_prefix(api_prefix: impl Into<String>) -> Self {
        Self {
            router: Router::new(),
            api_prefix: api_prefix.into(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `{api_prefix}/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let path = mount_path(&self.api_prefix, module_name);
        tracing::info!(module = module_name, path = %path, "mounting module routes");
        self.router = self.router.nest(&path, module_router);
        self
    }

    /// Mount every module in the registry
    pub fn mount_modules(mut self, registry: &ModuleRegistry) -> Self {
        for module in registry.modules() {
            self = self.mount_module(module.name(), module.routes());
        }
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Assign an `x-request-id` to each request and echo it on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Merge every module's OpenAPI fragment into one document, served raw at
    /// `/docs/openapi.json` and through Swagger UI at `/swagger-ui`
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry, &self.api_prefix);

        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "merged OpenAPI document is not valid; serving a stub");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("Shelf API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            });

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the server-wide OpenAPI document from module fragments
pub fn merged_openapi(registry: &ModuleRegistry, api_prefix: &str) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Shelf API",
            "version": "1.0.0",
            "description": "Book records service"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "object",
                "properties": {
                    "status": { "type": "integer" },
                    "code": { "type": "string" },
                    "message": { "type": "string" },
                    "error": {
                        "oneOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ]
                    },
                    "trace_id": { "type": "string" },
                    "timestamp": { "type": "string" }
                },
                "required": ["status", "code", "message", "trace_id", "timestamp"]
            }
        },
        "required": ["error"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": { "type": "string" }
                        }
                    }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        let base = mount_path(api_prefix, module.name());

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let full_path = if path == "/" {
                    base.clone()
                } else {
                    format!("{}{}", base, path)
                };
                openapi_spec["paths"][full_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}
