use std::collections::HashMap;
use std::sync::Arc;

use tiller_tools::DeclarativeTool;

/// The narrow registry shape the scheduler consumes.
///
/// Concrete registries may carry richer discovery behavior (MCP backends,
/// capability filtering); the scheduler only ever resolves by name and lists
/// known names for suggestions.
pub trait ToolRegistry: Send + Sync {
    fn get_tool(&self, name: &str) -> Option<Arc<dyn DeclarativeTool>>;

    fn tool_names(&self) -> Vec<String>;
}

/// HashMap-backed registry for embedders and tests.
#[derive(Default)]
pub struct StaticToolRegistry {
    tools: HashMap<String, Arc<dyn DeclarativeTool>>,
}

impl StaticToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn DeclarativeTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl ToolRegistry for StaticToolRegistry {
    fn get_tool(&self, name: &str) -> Option<Arc<dyn DeclarativeTool>> {
        self.tools.get(name).cloned()
    }

    fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}
