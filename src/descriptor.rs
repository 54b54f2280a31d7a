use std::any::Any;
use std::fmt;

use crate::error::{Error, ErrorKind, Result};

/// Type-erased staging slots for column values parsed before a `NeedsHold`
/// row can be constructed — one slot per constructor parameter, plus one
/// per regular member whose setter is staged for replay once the row
/// exists. Cleared and reused across records by [`RowDescriptor`]'s caller
/// (`RowConstructor`) rather than reallocated per row.
#[derive(Default)]
pub struct HoldSlots {
    slots: Vec<Option<Box<dyn Any + Send>>>,
}

impl HoldSlots {
    fn ensure_len(&mut self, n: usize) {
        if self.slots.len() < n {
            self.slots.resize_with(n, || None);
        }
    }

    pub(crate) fn set(&mut self, index: usize, value: Box<dyn Any + Send>) {
        self.ensure_len(index + 1);
        self.slots[index] = Some(value);
    }

    pub(crate) fn take_raw(&mut self, index: usize) -> Option<Box<dyn Any + Send>> {
        self.slots.get_mut(index)?.take()
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Takes and downcasts the value held at `index`, for use inside a
    /// [`InstanceProvider::NeedsHold`] closure. Returns `None` if the
    /// column never received a value in the record (the caller, usually
    /// the constructor closure itself, decides whether that's fatal).
    pub fn take<V: 'static>(&mut self, index: usize) -> Option<V> {
        self.take_raw(index)?.downcast::<V>().ok().map(|b| *b)
    }
}

/// How a row instance comes into being.
///
/// `Simple` covers `ConstructorNoArgs`/`StaticFactoryMethod`/`Delegate`: the
/// row exists before any column is applied, so each column's parsed value
/// is set directly on it as fields stream in.
///
/// `NeedsHold` covers `ConstructorWithParameters`: the row cannot exist
/// until every bound constructor argument has a value, so those columns
/// (and, to preserve per-column ordering, every other column too) stage
/// their parsed values into [`HoldSlots`] first. Once the record's last
/// value lands, the `NeedsHold` closure is invoked to build the row from
/// the held constructor arguments; regular-member columns are then
/// replayed onto the freshly built row.
pub enum InstanceProvider<T> {
    Simple(Box<dyn Fn() -> T + Send + Sync>),
    NeedsHold(Box<dyn Fn(&mut HoldSlots) -> Result<T> + Send + Sync>),
}

impl<T> InstanceProvider<T> {
    pub fn simple<F>(provider: F) -> InstanceProvider<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        InstanceProvider::Simple(Box::new(provider))
    }

    pub fn needs_hold<F>(build: F) -> InstanceProvider<T>
    where
        F: Fn(&mut HoldSlots) -> Result<T> + Send + Sync + 'static,
    {
        InstanceProvider::NeedsHold(Box::new(build))
    }

    pub(crate) fn is_needs_hold(&self) -> bool {
        matches!(self, InstanceProvider::NeedsHold(_))
    }
}

/// One column's read-side binding: parse the field text into a value and
/// apply it either straight to the row (`Simple` instance providers) or
/// into a [`HoldSlots`] slot (`NeedsHold` providers).
///
/// `Parser` and `Setter` are distinct concepts in the design (a parser can
/// be reused across columns of the same type; a setter is what's specific
/// to a field), but since Rust has no reflection to erase the intermediate
/// value's type for us, a `ColumnDescriptor` composes the two into boxed
/// closures at registration time via [`ColumnDescriptor::new`].
pub struct ColumnDescriptor<T> {
    name: Option<String>,
    required: bool,
    reset: Option<Box<dyn Fn(&mut T) + Send + Sync>>,
    parse: Box<dyn Fn(&str) -> Result<Box<dyn Any + Send>> + Send + Sync>,
    /// `None` for a column staged purely as a constructor argument: its
    /// value is consumed by the `NeedsHold` closure and never applied to
    /// the row directly.
    apply: Option<Box<dyn Fn(&mut T, Box<dyn Any + Send>) + Send + Sync>>,
    hold_slot: Option<usize>,
}

impl<T> fmt::Debug for ColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("hold_slot", &self.hold_slot)
            .finish()
    }
}

impl<T> ColumnDescriptor<T> {
    /// Builds a descriptor from a `Parser<V>` and a `Setter<T, V>`. Applies
    /// straight to the row unless later redirected with [`Self::into_hold`].
    pub fn new<V, P, S>(name: impl Into<Option<String>>, parser: P, setter: S) -> ColumnDescriptor<T>
    where
        V: Send + 'static,
        P: Fn(&str) -> std::result::Result<V, String> + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let name = name.into();
        let parse = {
            let column_name = name.clone();
            Box::new(move |text: &str| -> Result<Box<dyn Any + Send>> {
                match parser(text) {
                    Ok(v) => Ok(Box::new(v)),
                    Err(message) => Err(crate::error::new_error(ErrorKind::ParseFailed {
                        pos: None,
                        column: column_name.clone(),
                        message,
                    })),
                }
            })
        };
        let apply = Some(Box::new(move |row: &mut T, value: Box<dyn Any + Send>| {
            let value = value.downcast::<V>().expect("hold slot type matches the column that filled it");
            setter(row, *value);
        }) as Box<dyn Fn(&mut T, Box<dyn Any + Send>) + Send + Sync>);
        ColumnDescriptor { name, required: false, reset: None, parse, apply, hold_slot: None }
    }

    /// Marks this column as required: a record with no value for it raises
    /// `RequiredColumnMissing` instead of silently leaving the field unset.
    pub fn required(mut self, yes: bool) -> Self {
        self.required = yes;
        self
    }

    /// Runs before every record's parser/setter, even when the column
    /// receives no value in a short `flexible` record — matching "Reset
    /// runs before set" in the row-construction contract. For a column
    /// redirected into a hold slot, this runs on the row once it exists,
    /// immediately before the column's replayed value is applied.
    pub fn with_reset<R>(mut self, reset: R) -> Self
    where
        R: Fn(&mut T) + Send + Sync + 'static,
    {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Redirects this column's value into hold slot `slot` instead of
    /// applying it straight to the row. Required for every column bound to
    /// a [`RowDescriptor`] whose [`InstanceProvider`] is `NeedsHold`.
    ///
    /// `for_constructor_arg` marks a column that is itself one of the
    /// constructor's parameters: its held value is consumed solely by the
    /// `NeedsHold` closure (via [`HoldSlots::take`]) and is never replayed
    /// onto the row, so its setter is dropped. Columns for regular members
    /// (`for_constructor_arg = false`) keep their setter for the
    /// post-construction replay pass.
    pub fn into_hold(mut self, slot: usize, for_constructor_arg: bool) -> Self {
        self.hold_slot = Some(slot);
        if for_constructor_arg {
            self.apply = None;
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub(crate) fn hold_slot(&self) -> Option<usize> {
        self.hold_slot
    }

    pub(crate) fn parse(&self, text: &str) -> Result<Box<dyn Any + Send>> {
        (self.parse)(text)
    }

    /// Runs this column's reset (if any) without applying any value —
    /// used for held columns that never received a value in a `flexible`
    /// record, to keep reset timing consistent with the `Simple` path
    /// (reset always runs, even for unset columns).
    pub(crate) fn run_reset(&self, row: &mut T) {
        if let Some(reset) = &self.reset {
            reset(row);
        }
    }

    /// Runs this column's reset (if any) then applies `value` to `row`.
    /// A no-op if this column has no `apply` (a pure constructor-argument
    /// hold column).
    pub(crate) fn apply_to_row(&self, row: &mut T, value: Box<dyn Any + Send>) {
        if let Some(apply) = &self.apply {
            self.run_reset(row);
            apply(row, value);
        }
    }

    /// The `Simple`-provider path: parse `text` and apply straight to
    /// `row` in one step.
    pub(crate) fn parse_and_set(&self, row: &mut T, text: &str) -> Result<()> {
        let value = self.parse(text)?;
        self.apply_to_row(row, value);
        Ok(())
    }
}

/// One column's write-side binding: read a value out of the row and format
/// it to text, optionally skipping the column entirely.
pub struct WriteColumnDescriptor<T> {
    name: Option<String>,
    should_serialize: Option<Box<dyn Fn(&T) -> bool + Send + Sync>>,
    get_and_format: Box<dyn Fn(&T) -> String + Send + Sync>,
}

impl<T> fmt::Debug for WriteColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteColumnDescriptor").field("name", &self.name).finish()
    }
}

impl<T> WriteColumnDescriptor<T> {
    /// Builds a descriptor from a `Getter<T, V>` and a `Formatter<V>`,
    /// composed the same way `ColumnDescriptor::new` composes its read-side
    /// counterparts.
    pub fn new<V, G, F>(name: impl Into<Option<String>>, getter: G, formatter: F) -> WriteColumnDescriptor<T>
    where
        G: Fn(&T) -> V + Send + Sync + 'static,
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        let name = name.into();
        let get_and_format = Box::new(move |row: &T| formatter(&getter(row)));
        WriteColumnDescriptor { name, should_serialize: None, get_and_format }
    }

    /// A write-side-only predicate: skip this column for a given row
    /// instance entirely (distinct from the value being empty).
    pub fn should_serialize<S>(mut self, pred: S) -> Self
    where
        S: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.should_serialize = Some(Box::new(pred));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn should_write(&self, row: &T) -> bool {
        self.should_serialize.as_ref().map(|p| p(row)).unwrap_or(true)
    }

    pub(crate) fn format(&self, row: &T) -> String {
        (self.get_and_format)(row)
    }
}

/// The full set of column bindings for a row type, both directions.
pub struct RowDescriptor<T> {
    columns: Vec<ColumnDescriptor<T>>,
    write_columns: Vec<WriteColumnDescriptor<T>>,
    instance_provider: Option<InstanceProvider<T>>,
}

impl<T> Default for RowDescriptor<T> {
    fn default() -> RowDescriptor<T> {
        RowDescriptor { columns: Vec::new(), write_columns: Vec::new(), instance_provider: None }
    }
}

impl<T> RowDescriptor<T> {
    pub fn new() -> RowDescriptor<T> {
        RowDescriptor::default()
    }

    pub fn with_instance_provider(mut self, provider: InstanceProvider<T>) -> Self {
        self.instance_provider = Some(provider);
        self
    }

    pub fn push_column(&mut self, column: ColumnDescriptor<T>) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn push_write_column(&mut self, column: WriteColumnDescriptor<T>) -> &mut Self {
        self.write_columns.push(column);
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    pub fn write_columns(&self) -> &[WriteColumnDescriptor<T>] {
        &self.write_columns
    }

    /// True when rows built from this descriptor need the two-pass
    /// hold-slot construction protocol (see [`InstanceProvider::NeedsHold`]).
    pub(crate) fn needs_hold(&self) -> bool {
        self.instance_provider.as_ref().map(|p| p.is_needs_hold()).unwrap_or(false)
    }

    /// The `Simple`-provider path: builds the row before any column is
    /// applied. Panics (via `new_instance_for_hold`) if this descriptor's
    /// provider is `NeedsHold` — callers must check [`Self::needs_hold`]
    /// first.
    pub(crate) fn new_instance(&self) -> Result<T>
    where
        T: Default,
    {
        match &self.instance_provider {
            Some(InstanceProvider::Simple(provider)) => Ok(provider()),
            Some(InstanceProvider::NeedsHold(_)) => {
                unreachable!("new_instance called on a NeedsHold descriptor")
            }
            None => Ok(T::default()),
        }
    }

    /// The `NeedsHold`-provider path: builds the row from staged
    /// constructor-argument slots.
    pub(crate) fn new_instance_from_hold(&self, slots: &mut HoldSlots) -> Result<T> {
        match &self.instance_provider {
            Some(InstanceProvider::NeedsHold(build)) => build(slots),
            _ => unreachable!("new_instance_from_hold called on a non-NeedsHold descriptor"),
        }
    }
}

pub(crate) fn required_column_missing(column: &str) -> Error {
    crate::error::new_error(ErrorKind::RequiredColumnMissing { pos: None, column: column.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Row {
        id: i64,
        name: String,
    }

    #[test]
    fn parses_and_sets_a_column() {
        let col = ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |row: &mut Row, v: i64| row.id = v,
        );
        let mut row = Row::default();
        col.parse_and_set(&mut row, "42").unwrap();
        assert_eq!(row.id, 42);
    }

    #[test]
    fn parse_failure_surfaces_column_name() {
        let col = ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |row: &mut Row, v: i64| row.id = v,
        );
        let mut row = Row::default();
        let err = col.parse_and_set(&mut row, "not a number").unwrap_err();
        match err.kind() {
            crate::error::ErrorKind::ParseFailed { column, .. } => {
                assert_eq!(column.as_deref(), Some("id"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn reset_runs_before_set() {
        let col = ColumnDescriptor::new(
            Some("name".to_string()),
            |s: &str| Ok::<_, String>(s.to_string()),
            |row: &mut Row, v: String| row.name = v,
        )
        .with_reset(|row: &mut Row| row.name.clear());
        let mut row = Row { id: 0, name: "stale".to_string() };
        let value = col.parse("fresh").unwrap();
        col.apply_to_row(&mut row, value);
        assert_eq!(row.name, "fresh");
    }

    #[test]
    fn should_serialize_controls_write_skip() {
        let col = WriteColumnDescriptor::new("id", |r: &Row| r.id, |v: &i64| v.to_string())
            .should_serialize(|r: &Row| r.id != 0);
        assert!(col.should_write(&Row { id: 1, name: String::new() }));
        assert!(!col.should_write(&Row { id: 0, name: String::new() }));
    }

    #[test]
    fn hold_slot_roundtrips_typed_value() {
        let mut slots = HoldSlots::default();
        slots.set(0, Box::new(42i64));
        assert_eq!(slots.take::<i64>(0), Some(42));
        assert_eq!(slots.take::<i64>(0), None);
    }
}
