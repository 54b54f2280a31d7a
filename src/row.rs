use crate::descriptor::{required_column_missing, HoldSlots, RowDescriptor};
use crate::error::{new_error, Error, ErrorKind, Result};
use crate::headers::HeaderIndex;

/// How a record's fields are matched to a row's columns.
///
/// `Positional` columns are matched in descriptor order as fields stream
/// in. `ByName` columns are matched against a header record built once up
/// front, so each field must be looked up by the column's declared name
/// rather than assumed to line up with descriptor order.
///
/// This is independent of how the row instance itself comes into being —
/// see [`crate::descriptor::InstanceProvider`]'s `Simple`/`NeedsHold` split
/// for that axis; either `ConstructMode` can pair with either provider
/// kind.
pub enum ConstructMode {
    Positional,
    ByName(HeaderIndex),
}

/// Builds row instances from records according to a [`RowDescriptor`] and a
/// [`ConstructMode`]. Reuses one [`HoldSlots`] buffer across records when
/// the descriptor's instance provider is `NeedsHold`.
pub struct RowConstructor<'a, T> {
    descriptor: &'a RowDescriptor<T>,
    mode: ConstructMode,
    slots: HoldSlots,
}

impl<'a, T: Default> RowConstructor<'a, T> {
    pub fn new(descriptor: &'a RowDescriptor<T>, mode: ConstructMode) -> RowConstructor<'a, T> {
        RowConstructor { descriptor, mode, slots: HoldSlots::default() }
    }

    fn field_for_column<'f>(
        &self,
        col: &crate::descriptor::ColumnDescriptor<T>,
        positional_field: Option<&'f str>,
        by_name: Option<(&'f [String], &HeaderIndex)>,
    ) -> Option<&'f str> {
        match by_name {
            Some((fields, headers)) => {
                let pos = col.name().and_then(|name| headers.position(name))?;
                fields.get(pos).map(String::as_str)
            }
            None => positional_field,
        }
    }

    /// The `Simple`-provider path: the row exists up front, each column's
    /// parsed value is applied to it directly as fields arrive.
    fn construct_simple_positional<'f, I>(&self, fields: I) -> Result<T>
    where
        I: IntoIterator<Item = &'f str>,
    {
        let mut row = self.descriptor.new_instance()?;
        for col in self.descriptor.columns() {
            col.run_reset(&mut row);
        }
        let mut seen = vec![false; self.descriptor.columns().len()];
        let mut n_fields = 0;
        for (i, field) in fields.into_iter().enumerate() {
            n_fields += 1;
            if let Some(col) = self.descriptor.columns().get(i) {
                col.parse_and_set(&mut row, field)?;
                seen[i] = true;
            }
        }
        self.check_required(&seen, n_fields)?;
        Ok(row)
    }

    fn construct_simple_by_name(&self, fields: &[String], headers: &HeaderIndex) -> Result<T> {
        let mut row = self.descriptor.new_instance()?;
        for col in self.descriptor.columns() {
            col.run_reset(&mut row);
        }
        let mut seen = vec![false; self.descriptor.columns().len()];
        for (ci, col) in self.descriptor.columns().iter().enumerate() {
            if let Some(field) = self.field_for_column(col, None, Some((fields, headers))) {
                col.parse_and_set(&mut row, field)?;
                seen[ci] = true;
            }
        }
        self.check_required(&seen, fields.len())?;
        Ok(row)
    }

    /// The `NeedsHold`-provider path: every column's parsed value is staged
    /// into a hold slot first (the row cannot exist until the constructor
    /// has every bound argument), the provider closure then builds the row
    /// from the staged constructor arguments, and finally the remaining
    /// (non-constructor-argument) columns are replayed onto the built row
    /// in descriptor order.
    fn construct_needs_hold(
        &mut self,
        fields: &[String],
        headers: Option<&HeaderIndex>,
    ) -> Result<T> {
        self.slots.clear();
        let mut seen = vec![false; self.descriptor.columns().len()];
        for (ci, col) in self.descriptor.columns().iter().enumerate() {
            let field = match headers {
                Some(h) => self.field_for_column(col, None, Some((fields, h))),
                None => fields.get(ci).map(String::as_str),
            };
            let slot = col.hold_slot().ok_or_else(|| {
                new_error(ErrorKind::ConfigInvalid(format!(
                    "column {:?} has no hold slot but the row's instance provider is NeedsHold",
                    col.name().unwrap_or("<unnamed>")
                )))
            })?;
            if let Some(field) = field {
                let value = col.parse(field)?;
                self.slots.set(slot, value);
                seen[ci] = true;
            }
        }
        self.check_required(&seen, fields.len())?;
        let mut row = self.descriptor.new_instance_from_hold(&mut self.slots)?;
        for col in self.descriptor.columns() {
            let slot = col.hold_slot().expect("checked above");
            match self.slots.take_raw(slot) {
                Some(value) => col.apply_to_row(&mut row, value),
                None => col.run_reset(&mut row),
            }
        }
        Ok(row)
    }

    pub fn construct<'f, I>(&mut self, fields: I) -> Result<T>
    where
        I: IntoIterator<Item = &'f str>,
    {
        if self.descriptor.needs_hold() {
            let materialized: Vec<String> = fields.into_iter().map(str::to_string).collect();
            let headers = match &self.mode {
                ConstructMode::Positional => None,
                ConstructMode::ByName(headers) => Some(headers),
            };
            return self.construct_needs_hold(&materialized, headers);
        }
        match &self.mode {
            ConstructMode::Positional => self.construct_simple_positional(fields),
            ConstructMode::ByName(headers) => {
                let materialized: Vec<String> = fields.into_iter().map(str::to_string).collect();
                self.construct_simple_by_name(&materialized, headers)
            }
        }
    }

    fn check_required(&self, seen: &[bool], field_count: usize) -> Result<()> {
        let _ = field_count;
        for (col, &was_set) in self.descriptor.columns().iter().zip(seen) {
            if col.is_required() && !was_set {
                return Err(required_column_missing(col.name().unwrap_or("<unnamed>")));
            }
        }
        Ok(())
    }
}

/// Formats one row's fields for writing, in write-descriptor order.
pub fn format_row<T>(descriptor: &RowDescriptor<T>, row: &T) -> Vec<String> {
    descriptor
        .write_columns()
        .iter()
        .filter(|col| col.should_write(row))
        .map(|col| col.format(row))
        .collect()
}

pub(crate) fn unequal_lengths_error(expected_len: u64, len: u64) -> Error {
    new_error(ErrorKind::UnequalLengths { pos: None, expected_len, len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ColumnDescriptor, InstanceProvider, WriteColumnDescriptor};

    #[derive(Default, Debug, PartialEq)]
    struct Row {
        id: i64,
        name: String,
    }

    fn descriptor() -> RowDescriptor<Row> {
        let mut d = RowDescriptor::new();
        d.push_column(ColumnDescriptor::new(
            Some("id".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |r: &mut Row, v: i64| r.id = v,
        ));
        d.push_column(
            ColumnDescriptor::new(
                Some("name".to_string()),
                |s: &str| Ok::<_, String>(s.to_string()),
                |r: &mut Row, v: String| r.name = v,
            )
            .required(true),
        );
        d
    }

    #[test]
    fn positional_construction_applies_fields_in_order() {
        let d = descriptor();
        let mut rc = RowConstructor::new(&d, ConstructMode::Positional);
        let row = rc.construct(vec!["7", "alice"]).unwrap();
        assert_eq!(row, Row { id: 7, name: "alice".to_string() });
    }

    #[test]
    fn positional_construction_flags_missing_required_column() {
        let d = descriptor();
        let mut rc = RowConstructor::new(&d, ConstructMode::Positional);
        let err = rc.construct(vec!["7"]).unwrap_err();
        assert!(matches!(err.kind(), crate::error::ErrorKind::RequiredColumnMissing { .. }));
    }

    #[test]
    fn by_name_construction_matches_out_of_order_headers() {
        let d = descriptor();
        let headers = HeaderIndex::new(vec!["name".to_string(), "id".to_string()]);
        let mut rc = RowConstructor::new(&d, ConstructMode::ByName(headers));
        let row = rc.construct(vec!["bob", "9"]).unwrap();
        assert_eq!(row, Row { id: 9, name: "bob".to_string() });
    }

    #[test]
    fn formats_row_in_write_descriptor_order() {
        let mut d: RowDescriptor<Row> = RowDescriptor::new();
        d.push_write_column(WriteColumnDescriptor::new("id", |r: &Row| r.id, |v: &i64| v.to_string()));
        d.push_write_column(WriteColumnDescriptor::new("name", |r: &Row| r.name.clone(), |v: &String| v.clone()));
        let row = Row { id: 3, name: "carol".to_string() };
        assert_eq!(format_row(&d, &row), vec!["3".to_string(), "carol".to_string()]);
    }

    /// A row type with a two-argument constructor: both columns must be
    /// staged into hold slots before `Point::new` can run.
    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Point {
        fn new(x: i64, y: i64) -> Point {
            Point { x, y }
        }
    }

    impl Default for Point {
        fn default() -> Point {
            Point::new(0, 0)
        }
    }

    fn needs_hold_descriptor() -> RowDescriptor<Point> {
        let mut d: RowDescriptor<Point> = RowDescriptor::new().with_instance_provider(InstanceProvider::needs_hold(
            |slots: &mut crate::descriptor::HoldSlots| {
                let x = slots.take::<i64>(0).unwrap_or_default();
                let y = slots.take::<i64>(1).unwrap_or_default();
                Ok(Point::new(x, y))
            },
        ));
        d.push_column(
            ColumnDescriptor::new(
                Some("x".to_string()),
                |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
                |_r: &mut Point, _v: i64| unreachable!("x is a constructor argument, never replayed"),
            )
            .into_hold(0, true),
        );
        d.push_column(
            ColumnDescriptor::new(
                Some("y".to_string()),
                |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
                |_r: &mut Point, _v: i64| unreachable!("y is a constructor argument, never replayed"),
            )
            .into_hold(1, true),
        );
        d
    }

    #[test]
    fn needs_hold_constructs_row_from_staged_arguments() {
        let d = needs_hold_descriptor();
        let mut rc = RowConstructor::new(&d, ConstructMode::Positional);
        let row = rc.construct(vec!["3", "4"]).unwrap();
        assert_eq!(row, Point { x: 3, y: 4 });
    }

    #[test]
    fn needs_hold_replays_regular_member_after_construction() {
        #[derive(Debug, PartialEq)]
        struct Labeled {
            id: i64,
            label: String,
        }
        impl Labeled {
            fn new(id: i64) -> Labeled {
                Labeled { id, label: String::new() }
            }
        }
        impl Default for Labeled {
            fn default() -> Labeled {
                Labeled::new(0)
            }
        }
        let mut d: RowDescriptor<Labeled> =
            RowDescriptor::new().with_instance_provider(InstanceProvider::needs_hold(
                |slots: &mut crate::descriptor::HoldSlots| {
                    Ok(Labeled::new(slots.take::<i64>(0).unwrap_or_default()))
                },
            ));
        d.push_column(
            ColumnDescriptor::new(
                Some("id".to_string()),
                |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
                |_r: &mut Labeled, _v: i64| unreachable!("id is a constructor argument"),
            )
            .into_hold(0, true),
        );
        d.push_column(
            ColumnDescriptor::new(
                Some("label".to_string()),
                |s: &str| Ok::<_, String>(s.to_string()),
                |r: &mut Labeled, v: String| r.label = v,
            )
            .into_hold(1, false),
        );
        let mut rc = RowConstructor::new(&d, ConstructMode::Positional);
        let row = rc.construct(vec!["5", "hi"]).unwrap();
        assert_eq!(row, Labeled { id: 5, label: "hi".to_string() });
    }
}
