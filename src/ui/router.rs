use crate::storage::ProjectStore;

/// The three top-level views. Only one is shown at a time; the active
/// project is the only nested state.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Shortcuts,
    Projects,
    Project(String),
}

impl ViewState {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Shortcuts => "快捷指令库",
            Self::Projects => "我的项目",
            Self::Project(_) => "项目",
        }
    }
}

#[derive(Debug, Default)]
pub struct Router {
    view: ViewState,
}

impl Router {
    pub fn current(&self) -> &ViewState {
        &self.view
    }

    pub fn navigate(&mut self, view: ViewState) {
        self.view = view;
    }

    pub fn open_project(&mut self, id: &str) {
        self.view = ViewState::Project(id.to_string());
    }

    pub fn active_project_id(&self) -> Option<&str> {
        match &self.view {
            ViewState::Project(id) => Some(id),
            _ => None,
        }
    }

    /// The view to render. A project view whose project no longer exists
    /// degrades to the project list.
    pub fn resolve(&mut self, store: &ProjectStore) -> &ViewState {
        if let ViewState::Project(id) = &self.view {
            if !store.contains(id) {
                tracing::debug!("Active project {} is gone, showing project list", id);
                self.view = ViewState::Projects;
            }
        }
        &self.view
    }

    /// Called after a delete; leaves the project view if it showed `id`.
    pub fn project_deleted(&mut self, id: &str) {
        if self.active_project_id() == Some(id) {
            self.view = ViewState::Projects;
        }
    }
}
