use std::borrow::Cow;

use wasm_bindgen::JsValue;

/// Represents a value that can be either static or dynamic.
///
/// This is useful for cases where you want to accept a value that can be
/// either static or dynamic, such as in component props and in
/// [`wire`](crate::wire) expressions. A static value binds once; a dynamic
/// value is re-evaluated inside a tracked scope so that the signals it reads
/// become dependencies.
///
/// A [`MaybeDyn`] value can be created from a closure or from one of the
/// supported static types by using the [`From`] trait.
pub enum MaybeDyn<T> {
    /// A value bound once.
    Static(T),
    /// A value recomputed on demand.
    Dynamic(Box<dyn FnMut() -> T>),
}

impl<T> MaybeDyn<T> {
    /// Create a static value.
    pub fn new(value: T) -> Self {
        Self::Static(value)
    }

    /// Create a dynamic value from a closure.
    pub fn derived(f: impl FnMut() -> T + 'static) -> Self {
        Self::Dynamic(Box::new(f))
    }

    /// Evaluate the value by consuming itself.
    pub fn evaluate(self) -> T {
        match self {
            Self::Static(value) => value,
            Self::Dynamic(mut f) => f(),
        }
    }

    /// Get the value by copying it.
    ///
    /// If the type does not implement [`Copy`], consider using
    /// [`get_clone`](Self::get_clone) instead.
    pub fn get(&mut self) -> T
    where
        T: Copy,
    {
        match self {
            Self::Static(value) => *value,
            Self::Dynamic(f) => f(),
        }
    }

    /// Get the value by cloning it.
    ///
    /// If the type implements [`Copy`], consider using [`get`](Self::get)
    /// instead.
    pub fn get_clone(&mut self) -> T
    where
        T: Clone,
    {
        match self {
            Self::Static(value) => value.clone(),
            Self::Dynamic(f) => f(),
        }
    }

    /// Whether this is a [`MaybeDyn::Dynamic`] value.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<T, F, U> From<F> for MaybeDyn<T>
where
    F: FnMut() -> U + 'static,
    U: Into<T>,
{
    fn from(mut f: F) -> Self {
        Self::Dynamic(Box::new(move || f().into()))
    }
}

impl<T> From<Vec<T>> for MaybeDyn<Vec<T>> {
    fn from(value: Vec<T>) -> Self {
        Self::Static(value)
    }
}

macro_rules! impl_from_maybe_dyn {
    ($struct:ty => $($ty:ty),*) => {
        $(
            impl From<$ty> for $struct {
                fn from(value: $ty) -> Self {
                    Self::Static(value.into())
                }
            }
        )*
    };
}

/// A possibly dynamic string value.
pub type MaybeDynString = MaybeDyn<Cow<'static, str>>;
impl_from_maybe_dyn!(MaybeDynString => &'static str, String, Cow<'static, str>);

/// A possibly dynamic boolean value.
pub type MaybeDynBool = MaybeDyn<bool>;
impl_from_maybe_dyn!(MaybeDynBool => bool);

/// A possibly dynamic [`JsValue`].
pub type MaybeDynJsValue = MaybeDyn<JsValue>;
impl_from_maybe_dyn!(
    MaybeDynJsValue =>
    JsValue,
    String,
    &str,
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64
);
