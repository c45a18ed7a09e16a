use std::sync::Arc;

use plebchat_shared::GraphInfo;
use tracing::info;

use super::{echobot::EchoBot, fren::Fren, research::Research, Graph};
use crate::commands::CommandTableError;

/// Graphs the server can run, in listing order.
pub struct GraphRegistry {
    graphs: Vec<Arc<dyn Graph>>,
}

impl GraphRegistry {
    pub fn builtin() -> Result<Self, CommandTableError> {
        Self::with_graphs(vec![Arc::new(EchoBot), Arc::new(Fren), Arc::new(Research)])
    }

    /// Validates every command table up front.
    pub fn with_graphs(graphs: Vec<Arc<dyn Graph>>) -> Result<Self, CommandTableError> {
        for graph in &graphs {
            if let Some(table) = graph.commands() {
                table.validate()?;
            }
        }
        let registry = Self { graphs };
        info!(graphs = ?registry.ids(), "graph registry ready");
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Graph>> {
        self.graphs.iter().find(|g| g.info().id == id).cloned()
    }

    pub fn list(&self) -> Vec<GraphInfo> {
        self.graphs.iter().map(|g| g.info()).collect()
    }

    fn ids(&self) -> Vec<String> {
        self.graphs.iter().map(|g| g.info().id).collect()
    }
}
