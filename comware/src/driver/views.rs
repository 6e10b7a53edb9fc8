//! View tracking and navigation.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::error::{DriverError, Result};
use crate::platform::View;

/// Tracks the current view and finds the commands to reach another one.
///
/// Views and their parents form an undirected graph; moving between two
/// views walks the shortest path through it.
#[derive(Debug)]
pub struct ViewManager {
    views: IndexMap<String, View>,
    graph: HashMap<String, HashSet<String>>,
    current: Option<String>,
}

impl ViewManager {
    pub fn new(views: IndexMap<String, View>) -> Self {
        let graph = Self::build_graph(&views);

        // Until a prompt says otherwise, assume the root view.
        let current = views
            .iter()
            .find(|(_, v)| v.parent.is_none())
            .map(|(name, _)| name.clone());

        Self {
            views,
            graph,
            current,
        }
    }

    fn build_graph(views: &IndexMap<String, View>) -> HashMap<String, HashSet<String>> {
        let mut graph: HashMap<String, HashSet<String>> = HashMap::new();

        for (name, view) in views {
            graph.entry(name.clone()).or_default();
            if let Some(parent) = &view.parent {
                graph.entry(name.clone()).or_default().insert(parent.clone());
                graph.entry(parent.clone()).or_default().insert(name.clone());
            }
        }

        graph
    }

    /// The view a prompt belongs to.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&View> {
        self.views
            .values()
            .find(|view| view.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownView {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    pub fn current(&self) -> Option<&View> {
        self.current.as_ref().and_then(|name| self.views.get(name))
    }

    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.views.contains_key(name) {
            return Err(DriverError::UnknownView {
                prompt: name.to_string(),
            }
            .into());
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Update the current view from a prompt; returns its name.
    pub fn update_from_prompt(&mut self, prompt: &str) -> Result<String> {
        let name = self.determine_from_prompt(prompt)?.name.clone();
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    /// Shortest path between two views, both ends included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        if from == to {
            return Ok(vec![from.to_string()]);
        }

        let mut queue = VecDeque::from([from.to_string()]);
        let mut visited = HashSet::from([from.to_string()]);
        let mut parent: HashMap<String, String> = HashMap::new();

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to.to_string()];
                let mut node = to;
                while let Some(prev) = parent.get(node) {
                    path.push(prev.clone());
                    node = prev.as_str();
                }
                path.reverse();
                return Ok(path);
            }

            if let Some(neighbors) = self.graph.get(&current) {
                for neighbor in neighbors {
                    if visited.insert(neighbor.clone()) {
                        parent.insert(neighbor.clone(), current.clone());
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }

        Err(DriverError::NoViewPath {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }

    /// Command that moves from `from` to the adjacent view `to`.
    pub fn transition(&self, from: &str, to: &str) -> Option<&str> {
        let from_view = self.views.get(from)?;
        let to_view = self.views.get(to)?;

        if to_view.parent.as_deref() == Some(from) {
            return to_view.enter_command.as_deref();
        }
        if from_view.parent.as_deref() == Some(to) {
            return from_view.exit_command.as_deref();
        }
        None
    }
}
