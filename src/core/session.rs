//! MCP sessions.
//!
//! A session pairs one upstream client with the registries built around
//! it. The stdio transport opens one session for the life of the process;
//! the HTTP transport opens a fresh one per request with the caller's
//! credential and closes it when the response is written.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::client::GoldRushClient;
use crate::core::error::{RegistryError, ToolError};
use crate::core::registry::{
    MCPTool, ReadResourceResult, ResourceDescriptor, ResourceMeta, ResourceRegistry,
    ResourceRequest, ResourceTemplateDescriptor, ToolRegistry, ToolResult, resource_handler,
    tool_handler,
};
use crate::core::schema::{ParamSpec, ParameterSchema, ToolArgs};
use crate::{resources, tools};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Registering,
    Ready,
    Closed,
}

/// Per-session knobs handed to tool registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSettings {
    /// Cap on pages pulled by all-pages tools; `None` means unlimited.
    pub max_pages: Option<usize>,
}

/// Collects tool and resource bindings before a session goes live.
pub struct SessionBuilder {
    client: GoldRushClient,
    settings: SessionSettings,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    state: LifecycleState,
}

impl SessionBuilder {
    pub fn new(client: GoldRushClient, settings: SessionSettings) -> Self {
        Self {
            client,
            settings,
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Register a tool whose handler gets the session's client.
    pub fn tool<F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        params: Vec<ParamSpec>,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(GoldRushClient, ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.state = LifecycleState::Registering;
        let schema = ParameterSchema::new(name, params)?;
        let client = self.client.clone();
        self.tools.register(
            name,
            description,
            schema,
            tool_handler(move |args| handler(client.clone(), args)),
        )
    }

    /// Register a fixed-URI resource.
    pub fn resource<F, Fut>(&mut self, uri: &str, meta: ResourceMeta, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(GoldRushClient, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.state = LifecycleState::Registering;
        let client = self.client.clone();
        self.resources.register(
            uri,
            meta,
            resource_handler(move |request| handler(client.clone(), request)),
        )
    }

    /// Register a templated resource such as `status://chain/{chainName}`.
    pub fn resource_template<F, Fut>(
        &mut self,
        uri_template: &str,
        meta: ResourceMeta,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(GoldRushClient, ResourceRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.state = LifecycleState::Registering;
        let client = self.client.clone();
        self.resources.register_template(
            uri_template,
            meta,
            resource_handler(move |request| handler(client.clone(), request)),
        )
    }

    /// Freeze the registries and accept requests.
    pub fn build(self) -> Session {
        debug!(
            from = ?self.state(),
            tools = self.tools.list().len(),
            resources = self.resources.list().len(),
            "session ready"
        );
        Session {
            tools: self.tools,
            resources: self.resources,
            state: LifecycleState::Ready,
        }
    }
}

/// A ready set of tools and resources bound to one upstream client.
pub struct Session {
    tools: ToolRegistry,
    resources: ResourceRegistry,
    state: LifecycleState,
}

impl Session {
    /// Build a session with every GoldRush tool and resource registered.
    pub fn open(client: GoldRushClient, settings: SessionSettings) -> Result<Self, RegistryError> {
        let mut builder = SessionBuilder::new(client, settings);
        tools::register_all(&mut builder)?;
        resources::register_all(&mut builder)?;
        Ok(builder.build())
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn ensure_ready(&self) -> Result<(), RegistryError> {
        match self.state {
            LifecycleState::Ready => Ok(()),
            LifecycleState::Closed => Err(RegistryError::Closed),
            _ => Err(RegistryError::NotReady),
        }
    }

    pub fn tools(&self) -> Result<&[MCPTool], RegistryError> {
        self.ensure_ready()?;
        Ok(self.tools.list())
    }

    pub fn resources(&self) -> Result<Vec<ResourceDescriptor>, RegistryError> {
        self.ensure_ready()?;
        Ok(self.resources.list())
    }

    pub fn resource_templates(&self) -> Result<Vec<ResourceTemplateDescriptor>, RegistryError> {
        self.ensure_ready()?;
        Ok(self.resources.list_templates())
    }

    pub async fn dispatch(&self, name: &str, arguments: Option<Value>) -> Result<ToolResult, RegistryError> {
        self.ensure_ready()?;
        self.tools.call(name, arguments).await
    }

    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, RegistryError> {
        self.ensure_ready()?;
        self.resources.read(uri).await
    }

    /// Stop accepting requests.
    pub fn close(&mut self) {
        self.state = LifecycleState::Closed;
    }
}
