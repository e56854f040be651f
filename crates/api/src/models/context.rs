//! Type-erased resolver contexts.
//!
//! A [`ResolverContext`] is an immutable bag of user-supplied configuration
//! objects (search paths, version tables, ...) holding at most one object per
//! concrete type. Objects are kept sorted by a stable type key so that two
//! contexts built from the same objects compare, order and hash identically.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A configuration object that can be stored in a [`ResolverContext`].
///
/// Implemented for every `'static` type that is `Send + Sync + Debug + Eq +
/// Ord + Hash`; resolver implementations never implement it by hand.
pub trait ContextObject: Any + Send + Sync + fmt::Debug {
    /// Name of the concrete type, used as the primary ordering key.
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn dyn_eq(&self, other: &dyn ContextObject) -> bool;

    fn dyn_cmp(&self, other: &dyn ContextObject) -> Ordering;

    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> ContextObject for T
where
    T: Any + Send + Sync + fmt::Debug + Eq + Ord + Hash,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ContextObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_cmp(&self, other: &dyn ContextObject) -> Ordering {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.cmp(other),
            None => object_key(self).cmp(&object_key(other)),
        }
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

fn object_key(object: &dyn ContextObject) -> (&'static str, TypeId) {
    (object.type_name(), object.as_any().type_id())
}

/// An immutable, ordered set of context objects, one per concrete type.
#[derive(Clone, Default)]
pub struct ResolverContext {
    objects: Vec<Arc<dyn ContextObject>>,
}

impl ResolverContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding a single object.
    pub fn from_object<T: ContextObject>(object: T) -> Self {
        let mut context = Self::new();
        context.insert(Arc::new(object));
        context
    }

    /// Create a context from objects listed strongest first.
    ///
    /// When two objects share a concrete type the first one is kept.
    pub fn from_objects<I>(objects: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ContextObject>>,
    {
        let mut context = Self::new();
        for object in objects {
            context.insert(object);
        }
        context
    }

    /// Merge contexts listed strongest first, first object of a type wins.
    pub fn merged<'a, I>(contexts: I) -> Self
    where
        I: IntoIterator<Item = &'a ResolverContext>,
    {
        Self::from_objects(
            contexts
                .into_iter()
                .flat_map(|context| context.objects.iter().cloned()),
        )
    }

    /// Return a copy of this context with `object` added, unless an object of
    /// the same type is already held.
    pub fn with<T: ContextObject>(mut self, object: T) -> Self {
        self.insert(Arc::new(object));
        self
    }

    /// Insert an object. Returns `false` if an object of the same concrete
    /// type is already present, in which case the context is unchanged.
    pub fn insert(&mut self, object: Arc<dyn ContextObject>) -> bool {
        let key = object_key(object.as_ref());
        match self
            .objects
            .binary_search_by(|held| object_key(held.as_ref()).cmp(&key))
        {
            Ok(_) => false,
            Err(pos) => {
                self.objects.insert(pos, object);
                true
            }
        }
    }

    /// Get the held object of type `T`, if any.
    pub fn get<T: ContextObject>(&self) -> Option<&T> {
        self.objects
            .iter()
            .find_map(|held| held.as_ref().as_any().downcast_ref::<T>())
    }

    pub fn contains<T: ContextObject>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ContextObject> {
        self.objects.iter().map(|held| held.as_ref())
    }

    /// Human-readable description used in diagnostics.
    pub fn debug_string(&self) -> String {
        let parts: Vec<String> = self
            .objects
            .iter()
            .map(|object| format!("{:?}", object))
            .collect();
        format!("ResolverContext({})", parts.join(", "))
    }
}

impl PartialEq for ResolverContext {
    fn eq(&self, other: &Self) -> bool {
        self.objects.len() == other.objects.len()
            && self
                .objects
                .iter()
                .zip(&other.objects)
                .all(|(a, b)| a.dyn_eq(b.as_ref()))
    }
}

impl Eq for ResolverContext {}

impl PartialOrd for ResolverContext {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolverContext {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.objects.iter().zip(&other.objects) {
            match a.dyn_cmp(b.as_ref()) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.objects.len().cmp(&other.objects.len())
    }
}

impl Hash for ResolverContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.objects.len().hash(state);
        for object in &self.objects {
            object.dyn_hash(&mut *state);
        }
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResolverContext")
            .field(&self.objects)
            .finish()
    }
}

impl fmt::Display for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}
