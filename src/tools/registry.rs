use anyhow::anyhow;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tracing::Instrument;

#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema of the arguments object.
    fn schema(&self) -> serde_json::Value;
    async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value>;
}

/// A named group of tools sharing one backing resource.
pub trait Plugin {
    fn name(&self) -> &str;
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    // (registered_name, tool), in registration order
    tools: Arc<Vec<(String, Arc<dyn Tool>)>>,
    // registered_name -> position in `tools`
    index: Arc<HashMap<String, usize>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize tool names for `OpenAI` API compatibility.
    fn sanitize_tool_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn register(self, name: &str, tool: Arc<dyn Tool>) -> Self {
        let name = Self::sanitize_tool_name(name);

        let mut tools = (*self.tools).clone();
        let mut index = (*self.index).clone();

        // Re-registering a name replaces the earlier tool in place
        if let Some(&pos) = index.get(&name) {
            tools[pos] = (name, tool);
        } else {
            index.insert(name.clone(), tools.len());
            tools.push((name, tool));
        }

        Self {
            tools: Arc::new(tools),
            index: Arc::new(index),
        }
    }

    /// Register a single tool under its own name.
    #[must_use]
    pub fn with_tool(self, tool: Arc<dyn Tool>) -> Self {
        let name = tool.name().to_string();
        self.register(&name, tool)
    }

    /// Register every tool of a plugin as `plugin__tool`.
    #[must_use]
    pub fn with_plugin(self, plugin: &dyn Plugin) -> Self {
        let prefix = plugin.name().to_string();
        plugin.tools().into_iter().fold(self, |registry, tool| {
            let name = format!("{prefix}__{}", tool.name());
            registry.register(&name, tool)
        })
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn openai_tools_json(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|(name, t)| {
                let params = t.schema();
                let params = if params.is_object() {
                    params
                } else {
                    serde_json::json!({"type":"object","properties":{}})
                };

                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": name,
                        "description": t.description(),
                        "parameters": params
                    }
                })
            })
            .collect()
    }

    /// Execute a registered tool, e.g. `catalog__count_products`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let tool = self
            .index
            .get(name)
            .map(|&pos| Arc::clone(&self.tools[pos].1))
            .ok_or_else(|| anyhow!("unknown tool: {name}"))?;

        let span = tracing::info_span!("tool.call", gen_ai.tool.name = %name);
        tool.call(arguments).instrument(span).await
    }
}
