//! Tool and resource registries.
//!
//! Both registries are filled once while a session is being built and are
//! read-only afterwards. Tools are keyed by name; resources by exact URI or
//! by URI template.

use std::collections::HashMap;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::encoder;
use crate::core::error::{RegistryError, ToolError};
use crate::core::schema::{ParameterSchema, ToolArgs};

/// MCP tool definition structure, as listed by `tools/list`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MCPTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tool handler function type definition.
///
/// Handlers receive validated arguments and resolve to the raw payload;
/// encoding and error rendering happen at the dispatch boundary.
pub type ToolHandler = Box<dyn Fn(ToolArgs) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// Box an async closure into a [`ToolHandler`].
pub fn tool_handler<F, Fut>(handler: F) -> ToolHandler
where
    F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Box::new(move |args: ToolArgs| handler(args).boxed())
}

/// One text block of a tool result.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

/// Outcome of one `tools/call`. Always carries exactly one content block.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(text: String) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            content: vec![Content::text(format!("Error: {err}"))],
            is_error: true,
        }
    }
}

struct ToolBinding {
    schema: ParameterSchema,
    handler: ToolHandler,
}

/// Registry of available MCP tools.
///
/// `tools` keeps registration order for listing; `handlers` maps names to
/// their schema and handler for execution.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<MCPTool>,
    handlers: HashMap<String, ToolBinding>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names are unique per registry.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        schema: ParameterSchema,
        handler: ToolHandler,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }
        self.tools.push(MCPTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema.to_json().clone(),
        });
        self.handlers
            .insert(name.to_string(), ToolBinding { schema, handler });
        Ok(())
    }

    pub fn list(&self) -> &[MCPTool] {
        &self.tools
    }

    /// Validate `arguments`, run the tool and encode its result.
    ///
    /// Unknown tools and schema violations are protocol errors. Anything the
    /// handler raises becomes an `isError` result instead.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Result<ToolResult, RegistryError> {
        let binding = self
            .handlers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;

        let args = binding.schema.prepare(arguments).map_err(|violations| {
            warn!(tool = name, ?violations, "rejected tool arguments");
            RegistryError::InvalidParams {
                tool: name.to_string(),
                violations,
            }
        })?;

        debug!(tool = name, "dispatching tool");
        let outcome = match (binding.handler)(args).await {
            Ok(value) => encoder::encode(value),
            Err(err) => Err(err),
        };

        Ok(match outcome {
            Ok(text) => ToolResult::success(text),
            Err(err) => {
                warn!(tool = name, error = %err, "tool failed");
                ToolResult::error(&err)
            }
        })
    }
}

/// Listing entry for a fixed-URI resource.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub mime_type: String,
}

/// Listing entry for a templated resource.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDescriptor {
    pub uri_template: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub mime_type: String,
}

/// Metadata shared by both resource kinds.
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

/// A resource read, with any placeholder values already extracted.
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    pub uri: String,
    pub params: HashMap<String, String>,
}

pub type ResourceHandler =
    Box<dyn Fn(ResourceRequest) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

/// Box an async closure into a [`ResourceHandler`].
pub fn resource_handler<F, Fut>(handler: F) -> ResourceHandler
where
    F: Fn(ResourceRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Box::new(move |request: ResourceRequest| handler(request).boxed())
}

/// One entry of `resources/read` contents.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Placeholder(String),
}

/// A URI pattern such as `status://chain/{chainName}`.
///
/// Each placeholder matches a non-empty run of characters up to the next
/// `/` or the literal text that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<TemplatePart>,
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let invalid = |message: &str| RegistryError::InvalidTemplate {
            template: raw.to_string(),
            message: message.to_string(),
        };

        let mut parts = Vec::new();
        let mut rest = raw;
        while !rest.is_empty() {
            match rest.find('{') {
                Some(0) => {
                    let close = rest.find('}').ok_or_else(|| invalid("unclosed placeholder"))?;
                    let name = &rest[1..close];
                    if name.is_empty() || name.contains('{') {
                        return Err(invalid("malformed placeholder"));
                    }
                    if matches!(parts.last(), Some(TemplatePart::Placeholder(_))) {
                        return Err(invalid("adjacent placeholders"));
                    }
                    parts.push(TemplatePart::Placeholder(name.to_string()));
                    rest = &rest[close + 1..];
                }
                Some(open) => {
                    if rest[..open].contains('}') {
                        return Err(invalid("unmatched '}'"));
                    }
                    parts.push(TemplatePart::Literal(rest[..open].to_string()));
                    rest = &rest[open..];
                }
                None => {
                    if rest.contains('}') {
                        return Err(invalid("unmatched '}'"));
                    }
                    parts.push(TemplatePart::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        if !parts.iter().any(|p| matches!(p, TemplatePart::Placeholder(_))) {
            return Err(invalid("template has no placeholders"));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Extract placeholder values from `uri`, or `None` if it does not fit.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut values = HashMap::new();
        let mut rest = uri;

        for (index, part) in self.parts.iter().enumerate() {
            match part {
                TemplatePart::Literal(literal) => rest = rest.strip_prefix(literal.as_str())?,
                TemplatePart::Placeholder(name) => {
                    let segment_end = rest.find('/').unwrap_or(rest.len());
                    let end = match self.parts.get(index + 1) {
                        Some(TemplatePart::Literal(next)) => rest[..segment_end]
                            .find(next.as_str())
                            .or_else(|| next.starts_with('/').then_some(segment_end))?,
                        _ => segment_end,
                    };
                    let value = &rest[..end];
                    if value.is_empty() {
                        return None;
                    }
                    // Values arrive percent-encoded; keep the raw text if it does not decode.
                    let decoded = urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    values.insert(name.clone(), decoded);
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(values)
    }
}

struct ExactResource {
    descriptor: ResourceDescriptor,
    handler: ResourceHandler,
}

struct TemplatedResource {
    descriptor: ResourceTemplateDescriptor,
    template: UriTemplate,
    handler: ResourceHandler,
}

/// Registry of readable resources.
#[derive(Default)]
pub struct ResourceRegistry {
    exact: Vec<ExactResource>,
    templates: Vec<TemplatedResource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        uri: &str,
        meta: ResourceMeta,
        handler: ResourceHandler,
    ) -> Result<(), RegistryError> {
        if self.exact.iter().any(|r| r.descriptor.uri == uri) {
            return Err(RegistryError::DuplicateResource(uri.to_string()));
        }
        self.exact.push(ExactResource {
            descriptor: ResourceDescriptor {
                uri: uri.to_string(),
                name: meta.name.to_string(),
                title: meta.title.to_string(),
                description: meta.description.to_string(),
                mime_type: meta.mime_type.to_string(),
            },
            handler,
        });
        Ok(())
    }

    pub fn register_template(
        &mut self,
        uri_template: &str,
        meta: ResourceMeta,
        handler: ResourceHandler,
    ) -> Result<(), RegistryError> {
        if self
            .templates
            .iter()
            .any(|r| r.template.as_str() == uri_template)
        {
            return Err(RegistryError::DuplicateResource(uri_template.to_string()));
        }
        let template = UriTemplate::parse(uri_template)?;
        self.templates.push(TemplatedResource {
            descriptor: ResourceTemplateDescriptor {
                uri_template: uri_template.to_string(),
                name: meta.name.to_string(),
                title: meta.title.to_string(),
                description: meta.description.to_string(),
                mime_type: meta.mime_type.to_string(),
            },
            template,
            handler,
        });
        Ok(())
    }

    pub fn list(&self) -> Vec<ResourceDescriptor> {
        self.exact.iter().map(|r| r.descriptor.clone()).collect()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplateDescriptor> {
        self.templates.iter().map(|r| r.descriptor.clone()).collect()
    }

    /// Read `uri`. Exact URIs win over templates; templates are tried in
    /// registration order.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, RegistryError> {
        let (request, handler, mime_type) = if let Some(resource) =
            self.exact.iter().find(|r| r.descriptor.uri == uri)
        {
            let request = ResourceRequest {
                uri: uri.to_string(),
                params: HashMap::new(),
            };
            (request, &resource.handler, &resource.descriptor.mime_type)
        } else {
            self.templates
                .iter()
                .find_map(|r| {
                    r.template.matches(uri).map(|params| {
                        let request = ResourceRequest {
                            uri: uri.to_string(),
                            params,
                        };
                        (request, &r.handler, &r.descriptor.mime_type)
                    })
                })
                .ok_or_else(|| RegistryError::UnknownResource(uri.to_string()))?
        };

        debug!(uri, "reading resource");
        let failed = |source: ToolError| RegistryError::ResourceFailed {
            uri: uri.to_string(),
            source,
        };
        let value = handler(request).await.map_err(failed)?;
        let text = encoder::encode(value).map_err(failed)?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: mime_type.clone(),
                text,
            }],
        })
    }
}
