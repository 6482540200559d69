//! Open a graph from the graph list.

use crate::error::ExportError;
use crate::page::{selectors, PageDriver};
use tracing::{info, warn};

/// Click the entry whose text is `graph_name`.
pub async fn open_graph(page: &dyn PageDriver, graph_name: &str) -> Result<(), ExportError> {
    info!(step = "open-graph", "selecting graph {graph_name}");

    match page.click_text(graph_name, selectors::ACTION_TIMEOUT).await {
        Ok(()) => {
            info!(step = "open-graph", "graph opening");
            Ok(())
        }
        Err(source) => {
            let err = ExportError::OpenGraph {
                graph: graph_name.to_string(),
                source,
            };
            warn!(step = "open-graph", "{err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::mock::MockPage;
    use crate::workflow::log_capture;

    #[tokio::test]
    async fn test_clicks_graph_by_name() {
        let page = MockPage::new();
        open_graph(&page, "research-notes").await.unwrap();
        assert_eq!(page.calls(), vec!["click_text:research-notes"]);
    }

    #[tokio::test]
    async fn test_unknown_graph_is_an_error() {
        let page = MockPage::new().missing("nope");
        let err = open_graph(&page, "nope").await.unwrap_err();
        assert!(matches!(err, ExportError::OpenGraph { ref graph, .. } if graph == "nope"));
    }

    #[tokio::test]
    async fn test_unknown_graph_is_logged() {
        let (_guard, logs) = log_capture::capture();
        let page = MockPage::new().missing("nope");
        open_graph(&page, "nope").await.unwrap_err();

        let warnings = logs.warnings_for("open-graph");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("nope"));
    }
}
