//! Public macros for ergonomic bean lookup.

/// Looks a bean up in a container, panicking if it cannot be resolved.
///
/// Use it where a missing bean is a wiring bug. For a non-panicking lookup,
/// call [`Container::get`](crate::Container::get) or
/// [`Container::get_as`](crate::Container::get_as) directly.
///
/// # Panics
///
/// Panics if the bean cannot be resolved, or is not a `$type`.
///
/// # Examples
///
/// ```
/// use fibre_bean::{bean, ClassBuilder, Container, DefinitionSpec};
///
/// #[derive(Default)]
/// struct Clock {
///   zone: String,
/// }
///
/// let container = Container::new();
/// container.add_class(
///   ClassBuilder::<Clock>::with_default("Clock")
///     .field("zone", |c: &mut Clock, zone: String| c.zone = zone)
///     .build(),
/// );
/// container.add_definitions([("clock".to_string(), DefinitionSpec::new("Clock").property("zone", "UTC"))]);
/// container.init().unwrap();
///
/// // Typed lookup
/// let clock = bean!(container, Clock, "clock");
/// assert_eq!(clock.zone, "UTC");
///
/// // Untyped lookup by class name
/// let handle = bean!(container, "Clock");
/// assert_eq!(handle.class_name(), "Clock");
/// ```
#[macro_export]
macro_rules! bean {
    // Arm for a typed lookup: bean!(container, MyType, "name")
    ($container:expr, $type:ty, $name:expr) => {
        $container
            .get_as::<$type>($name)
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required bean '{}' as {}: {}",
                    $name,
                    std::any::type_name::<$type>(),
                    e
                )
            })
    };

    // Arm for an untyped lookup: bean!(container, "name")
    ($container:expr, $name:expr) => {
        $container
            .get($name)
            .unwrap_or_else(|e| panic!("Failed to resolve required bean '{}': {}", $name, e))
    };
}
