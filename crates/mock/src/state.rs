use futures_lite::future::Boxed;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use yangval_core::{Element, FilterNode, StateError, StateProvider, StateRequest, StateResponse};

/// Scripted [`StateProvider`]: answers every request from a fixed element set
/// and records what it was asked for.
#[derive(Debug, Clone, Default)]
pub struct MockStateProvider {
    elements: Vec<Element>,
    delay: Option<Duration>,
    failure: Option<StateError>,
    filtering: bool,
    requests: Arc<Mutex<Vec<StateRequest>>>,
}

impl MockStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element returned for any anchor whose filter names it.
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    /// Delays every response; used to exercise the retrieval timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Applies content matches of the request filter: list entries without a
    /// leaf equal to the match value are left out of the response.
    pub fn with_filtering(mut self) -> Self {
        self.filtering = true;
        self
    }

    pub fn failing(mut self, error: StateError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn requests(&self) -> Vec<StateRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn respond(&self, request: &StateRequest) -> StateResponse {
        request
            .iter()
            .map(|(anchor, filter)| {
                let matching = self
                    .elements
                    .iter()
                    .filter(|element| filter.names().contains(element.name()))
                    .map(|element| match filter.tree().iter().find(|node| node.name() == element.name()) {
                        Some(node) if self.filtering => narrow(element, node),
                        _ => element.clone(),
                    })
                    .collect();
                (anchor.clone(), matching)
            })
            .collect()
    }
}

fn narrow(element: &Element, filter: &FilterNode) -> Element {
    if element.value().is_some() {
        return element.clone();
    }
    element
        .children()
        .iter()
        .filter_map(|child| match filter.children().iter().find(|node| node.name() == child.name()) {
            Some(node) if node.match_value().is_some_and(|value| !has_leaf_value(child, value)) => None,
            Some(node) => Some(narrow(child, node)),
            None => Some(child.clone()),
        })
        .fold(Element::new(element.name().clone()), Element::with_child)
}

fn has_leaf_value(entry: &Element, value: &str) -> bool {
    entry.children().iter().any(|leaf| leaf.value().is_some_and(|v| v.to_text() == value))
}

impl StateProvider for MockStateProvider {
    fn retrieve_state(&self, request: StateRequest) -> Boxed<Result<StateResponse, StateError>> {
        let outcome = match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.respond(&request)),
        };
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                async_io::Timer::after(delay).await;
            }
            outcome
        })
    }
}
