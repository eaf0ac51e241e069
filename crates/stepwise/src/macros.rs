//! Convenience macros for building argument lists and contexts.

/// Build a `Vec<Value>` of explicit step arguments.
///
/// # Examples
///
/// ```
/// use stepwise::values;
///
/// let args = values![1_i64, String::from("two")];
/// assert_eq!(args.len(), 2);
/// assert!(args[1].is::<String>());
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($value)),+]
    };
}

/// Build a [`Context`](crate::Context) from `key => value` pairs, in order.
///
/// # Examples
///
/// ```
/// use stepwise::context;
///
/// let context = context! {
///     "hero" => String::from("Batman"),
///     "logins" => 2_u8,
/// };
/// assert_eq!(context.get_as::<u8>("logins"), Some(2));
/// assert_eq!(context.keys().collect::<Vec<_>>(), ["hero", "logins"]);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut context = $crate::Context::new();
        $(context.set($key, $value);)+
        context
    }};
}
