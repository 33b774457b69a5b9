use super::{error::Error, method::Method};

type Constructor = Box<dyn Fn(usize) -> Result<Box<dyn Method>, Error>>;

/// Immutable registry entry mapping a method name to its constructor.
///
/// The constructor receives the input dimensionality and may reject it (e.g.
/// single-variable root-finders refuse anything but one dimension).
pub struct MethodDescriptor {
    name: String,
    constructor: Constructor,
}

impl MethodDescriptor {
    /// Creates a descriptor from a name and a constructor.
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(usize) -> Result<Box<dyn Method>, Error> + 'static,
    {
        Self {
            name: name.into(),
            constructor: Box::new(constructor),
        }
    }

    /// Name under which the method is selected.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructs a fresh instance for the given dimensionality.
    pub fn build(&self, dimensions: usize) -> Result<Box<dyn Method>, Error> {
        (self.constructor)(dimensions)
    }
}

/// Name-keyed collection of available methods.
///
/// [`Registry::with_builtins`] contains every method this crate implements;
/// collaborators add their own algorithms with [`Registry::register`].
#[derive(Default)]
pub struct Registry {
    entries: Vec<MethodDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with all built-in methods.
    pub fn with_builtins() -> Self {
        use crate::methods::*;

        let mut registry = Self::new();

        registry.register(MethodDescriptor::new("bisection", |dim| {
            Ok(Box::new(Bisection::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("brent-dekker", |dim| {
            Ok(Box::new(BrentDekker::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("newton-raphson", |dim| {
            Ok(Box::new(NewtonRaphson::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("secant", |dim| {
            Ok(Box::new(Secant::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("brents-localmin", |dim| {
            Ok(Box::new(BrentLocalmin::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("nelder-mead", |dim| {
            Ok(Box::new(NelderMead::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("differential evolution", |dim| {
            Ok(Box::new(DifferentialEvolution::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("gradient estimate", |dim| {
            Ok(Box::new(GradientEstimate::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("trapezoidal", |dim| {
            Ok(Box::new(Trapezoidal::new(dim)?) as Box<dyn Method>)
        }));
        registry.register(MethodDescriptor::new("simpson", |dim| {
            Ok(Box::new(Simpson::new(dim)?) as Box<dyn Method>)
        }));

        registry
    }

    /// Adds a descriptor to the registry.
    pub fn register(&mut self, descriptor: MethodDescriptor) {
        self.entries.push(descriptor);
    }

    /// Iterates over the registered method names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name())
    }

    /// Looks the named method up and constructs a fresh instance for the
    /// given dimensionality.
    pub fn build(&self, name: &str, dimensions: usize) -> Result<Box<dyn Method>, Error> {
        self.entries
            .iter()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))?
            .build(dimensions)
    }
}
