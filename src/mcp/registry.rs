//! MCP Tool Registry
//!
//! Keeps tools in registration order so `tools/list` is stable across runs.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::context::ToolContext;
use super::protocol::{ToolAnnotations, ToolDefinition, ToolsCallResult};

// ============================================================================
// Tool Types
// ============================================================================

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolsCallResult> + Send>>;

/// Tool handler function type. Handlers never fail at the protocol level:
/// errors are rendered into the returned result.
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub handler: ToolHandler,
    pub category: ToolCategory,
}

impl RegisteredTool {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
            annotations: Some(ToolAnnotations {
                read_only_hint: self.category == ToolCategory::Read,
                destructive_hint: self.category == ToolCategory::Destructive,
            }),
        }
    }
}

/// What a tool does to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    Read,
    Write,
    Destructive,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Read => "read",
            ToolCategory::Write => "write",
            ToolCategory::Destructive => "destructive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

// ============================================================================
// Registry
// ============================================================================

pub struct McpRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Re-registering a name replaces the earlier tool in
    /// place.
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        match self.index.get(&tool.name) {
            Some(&position) => self.tools[position] = tool,
            None => {
                self.index.insert(tool.name.clone(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Definitions in registration order
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(RegisteredTool::definition).collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
    category: ToolCategory,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            category: ToolCategory::Read,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn param(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push_param(name, kind, description, true)
    }

    pub fn optional_param(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push_param(name, kind, description, false)
    }

    fn push_param(mut self, name: &str, kind: ParamKind, description: &str, required: bool) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        });
        self
    }

    pub fn category(mut self, cat: ToolCategory) -> Self {
        self.category = cat;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolsCallResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            params: self.params,
            category: self.category,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}
