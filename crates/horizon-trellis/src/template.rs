//! Template plumbing.
//!
//! A [`Template`] is a pure function from a JSON object map to a
//! [`Fragment`]. How the map is produced is decided by a [`DataProvider`];
//! by default a view hands its template the serde serialization of its bound
//! model, then merges its render helpers over the top.

use std::fmt;
use std::sync::Arc;

use horizon_trellis_core::logging::targets;
use serde::Serialize;
use serde_json::Value;

use crate::dom::Fragment;

/// The data passed to a template.
pub type TemplateData = serde_json::Map<String, Value>;

/// A compiled template.
///
/// # Example
///
/// ```
/// use horizon_trellis::dom::Element;
/// use horizon_trellis::template::{Template, TemplateData};
///
/// let template = Template::new(|data: &TemplateData| {
///     let title = data.get("title").and_then(|v| v.as_str()).unwrap_or_default();
///     Element::new("h1").with_text(title).into()
/// });
///
/// let mut data = TemplateData::new();
/// data.insert("title".into(), "Inbox".into());
/// assert_eq!(template.render(&data).to_markup(), "<h1>Inbox</h1>");
/// ```
#[derive(Clone)]
pub struct Template {
    render: Arc<dyn Fn(&TemplateData) -> Fragment + Send + Sync>,
}

impl Template {
    /// Wrap a render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&TemplateData) -> Fragment + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    /// A template that ignores its data and always yields a copy of the
    /// fragment built by `build`.
    pub fn fixed<F>(build: F) -> Self
    where
        F: Fn() -> Fragment + Send + Sync + 'static,
    {
        Self::new(move |_| build())
    }

    /// Render the template.
    pub fn render(&self, data: &TemplateData) -> Fragment {
        (self.render)(data)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").finish_non_exhaustive()
    }
}

/// A model that can feed a template.
///
/// Implemented for every `Serialize + Send + Sync` type.
pub trait ModelData: Send + Sync {
    /// The model's serialized form.
    fn to_value(&self) -> Value;
}

impl<T: Serialize + Send + Sync> ModelData for T {
    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            tracing::warn!(target: targets::VIEW, %err, "model failed to serialize");
            Value::Null
        })
    }
}

/// Convert a model into template data.
///
/// Objects are used as-is, `null` becomes an empty map, and any other value
/// is exposed under the `"value"` key.
pub fn model_template_data(model: Option<&dyn ModelData>) -> TemplateData {
    match model.map(|model| model.to_value()) {
        Some(Value::Object(map)) => map,
        None | Some(Value::Null) => TemplateData::new(),
        Some(other) => {
            let mut map = TemplateData::new();
            map.insert("value".into(), other);
            map
        }
    }
}

type ComputeFn = Arc<dyn Fn(Option<&dyn ModelData>) -> TemplateData + Send + Sync>;

/// Where a view's template data comes from.
#[derive(Clone, Default)]
pub enum DataProvider {
    /// The bound model's serialized form.
    #[default]
    Model,
    /// A fixed map.
    Static(TemplateData),
    /// A function of the bound model.
    Computed(ComputeFn),
}

impl DataProvider {
    /// Build a computed provider.
    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn(Option<&dyn ModelData>) -> TemplateData + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(compute))
    }

    /// Produce template data for `model`, with `helpers` merged over it.
    pub fn resolve(&self, model: Option<&dyn ModelData>, helpers: &TemplateData) -> TemplateData {
        let mut data = match self {
            Self::Model => model_template_data(model),
            Self::Static(map) => map.clone(),
            Self::Computed(compute) => compute(model),
        };
        for (key, value) in helpers {
            data.insert(key.clone(), value.clone());
        }
        data
    }
}

impl fmt::Debug for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("Model"),
            Self::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Self::Computed(_) => f.write_str("Computed"),
        }
    }
}
