use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::capability::ViewModel;
use crate::context::TargetId;
use crate::error::{BoxError, RegionError, Result};
use crate::region::ViewHandle;

/// Turns a requested target into a fresh view-model instance.
///
/// Implementations may perform dependency injection; they must not touch any
/// region.
#[async_trait]
pub trait ViewModelResolver: Send + Sync {
    async fn resolve(&self, target: &str) -> std::result::Result<Arc<dyn ViewModel>, BoxError>;
}

/// Produces the view for a resolved view-model.
pub trait ViewResolver: Send + Sync {
    fn resolve_view(
        &self,
        view_model_type: &'static str,
        view_model: &Arc<dyn ViewModel>,
    ) -> std::result::Result<ViewHandle, BoxError>;
}

/// Factory creating a fresh view-model for a registered target.
pub type ViewModelFactory = Arc<dyn Fn() -> Arc<dyn ViewModel> + Send + Sync>;

/// Factory creating the view paired with a view-model.
pub type ViewFactory = Arc<dyn Fn(&Arc<dyn ViewModel>) -> ViewHandle + Send + Sync>;

/// Declarative target definition registered with a [`TargetCatalog`].
pub struct TargetDefinition {
    pub id: TargetId,
    pub view_model_type: &'static str,
    pub view_model: ViewModelFactory,
    pub view: ViewFactory,
    pub metadata: TargetMetadata,
}

impl TargetDefinition {
    /// The view factory is keyed by `std::any::type_name::<VM>()`, which is
    /// what [`ViewModel::type_name`] reports unless overridden.
    pub fn new<VM, M, V>(id: impl Into<TargetId>, view_model: M, view: V) -> Self
    where
        VM: ViewModel,
        M: Fn() -> VM + Send + Sync + 'static,
        V: Fn(&Arc<dyn ViewModel>) -> ViewHandle + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            view_model_type: std::any::type_name::<VM>(),
            view_model: Arc::new(move || Arc::new(view_model()) as Arc<dyn ViewModel>),
            view: Arc::new(view),
            metadata: TargetMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: TargetMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Optional metadata carried alongside a target definition.
#[derive(Default, Clone, Debug)]
pub struct TargetMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
struct CatalogEntry {
    view_model: ViewModelFactory,
    metadata: TargetMetadata,
}

/// Factory-backed resolver pair.
///
/// View factories are keyed by the view-model's type name, so every target
/// sharing a view-model type shares a view factory; the most recent
/// registration wins.
#[derive(Default)]
pub struct TargetCatalog {
    targets: RwLock<HashMap<TargetId, CatalogEntry>>,
    views: RwLock<HashMap<&'static str, ViewFactory>>,
}

impl TargetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, definition: TargetDefinition) -> Result<()> {
        self.views
            .write()
            .map_err(|_| RegionError::Poisoned("target catalog"))?
            .insert(definition.view_model_type, definition.view);
        self.targets
            .write()
            .map_err(|_| RegionError::Poisoned("target catalog"))?
            .insert(
                definition.id,
                CatalogEntry {
                    view_model: definition.view_model,
                    metadata: definition.metadata,
                },
            );
        Ok(())
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets
            .read()
            .map(|targets| targets.contains_key(target))
            .unwrap_or(false)
    }

    pub fn metadata(&self, target: &str) -> Option<TargetMetadata> {
        self.targets
            .read()
            .ok()?
            .get(target)
            .map(|entry| entry.metadata.clone())
    }

    fn entry(&self, target: &str) -> Result<CatalogEntry> {
        self.targets
            .read()
            .map_err(|_| RegionError::Poisoned("target catalog"))?
            .get(target)
            .cloned()
            .ok_or_else(|| RegionError::TargetNotRegistered(target.to_string()))
    }
}

#[async_trait]
impl ViewModelResolver for TargetCatalog {
    async fn resolve(&self, target: &str) -> std::result::Result<Arc<dyn ViewModel>, BoxError> {
        let entry = self.entry(target)?;
        Ok((entry.view_model)())
    }
}

impl ViewResolver for TargetCatalog {
    fn resolve_view(
        &self,
        view_model_type: &'static str,
        view_model: &Arc<dyn ViewModel>,
    ) -> std::result::Result<ViewHandle, BoxError> {
        let factory = self
            .views
            .read()
            .map_err(|_| RegionError::Poisoned("target catalog"))?
            .get(view_model_type)
            .cloned()
            .ok_or_else(|| RegionError::TargetNotRegistered(view_model_type.to_string()))?;
        Ok(factory(view_model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::View;

    struct HomeViewModel;
    impl ViewModel for HomeViewModel {}

    struct HomeView;
    impl View for HomeView {
        fn name(&self) -> &str {
            "home"
        }
    }

    fn catalog() -> TargetCatalog {
        let catalog = TargetCatalog::new();
        catalog
            .register(
                TargetDefinition::new(
                    "home",
                    || HomeViewModel,
                    |_vm: &Arc<dyn ViewModel>| ViewHandle::new(HomeView),
                )
                .with_metadata(TargetMetadata {
                    title: Some("Home".into()),
                    description: None,
                }),
            )
            .unwrap();
        catalog
    }

    #[tokio::test]
    async fn resolves_registered_targets() {
        let catalog = catalog();
        let vm = catalog.resolve("home").await.unwrap();
        let view = catalog.resolve_view(vm.type_name(), &vm).unwrap();
        assert_eq!(view.name(), "home");
        assert_eq!(catalog.metadata("home").unwrap().title.as_deref(), Some("Home"));
    }

    #[tokio::test]
    async fn each_resolution_is_a_fresh_instance() {
        let catalog = catalog();
        let first = catalog.resolve("home").await.unwrap();
        let second = catalog.resolve("home").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn unknown_target_is_an_error() {
        let catalog = catalog();
        let err = catalog.resolve("missing").await.err().unwrap();
        assert!(err.to_string().contains("missing"));
        assert!(!catalog.contains("missing"));
    }
}
