//! Class definition views: the record view, its member streams, and the shared
//! traversal machinery.
//!
//! # Key Components
//!
//! - [`ClassDef`] - lazy record view over one `class_def_item`
//! - [`ClassDefList`] - fixed-stride table of all class definitions
//! - [`FieldList`] / [`MethodList`] - index-based views over the delta-encoded
//!   member streams
//! - [`EncodedField`] / [`EncodedMethod`] - one decoded member each
//!
//! The traversal core lives in the private `members` module; both member streams
//! run on the same walker so their skip and decode paths cannot diverge.

mod classdef;
mod field;
mod members;
mod method;

pub use classdef::{ClassDef, ClassDefIterator, ClassDefList};
pub use field::{EncodedField, FieldIterator, FieldList};
pub use method::{EncodedMethod, MethodIterator, MethodList};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::flags::AccessFlags, test::DexBuilder, Result};

    /// One fully populated class: two interfaces, three fields (two static, one
    /// instance), two methods, field and method annotations, and one explicit
    /// static value.
    fn build_class() -> (Vec<u8>, crate::metadata::header::DexHeader, u32) {
        let mut builder = DexBuilder::new();
        builder.strings(&[
            "LFoo;",
            "Ljava/lang/Object;",
            "Ljava/lang/Runnable;",
            "Ljava/io/Closeable;",
            "Foo.java",
            "LMarker;",
        ]);
        builder.types(&[0, 1, 2, 3, 5]);

        let interfaces = builder.pos();
        builder.u32(2);
        builder.u16(2); // Ljava/lang/Runnable;
        builder.u16(3); // Ljava/io/Closeable;
        builder.align4();

        // Static values: one explicit byte value for the first static field
        let static_values = builder.pos();
        builder.uleb128(1);
        builder.u8(0x00); // byte header
        builder.u8(0x2A);

        // Annotation item + set for field ordinal 4 and method ordinal 9
        let annotation_item = builder.pos();
        builder.u8(0x01); // runtime visibility
        builder.uleb128(4); // type LMarker;
        builder.uleb128(0);

        let annotation_set = builder.pos();
        builder.u32(1);
        builder.u32(annotation_item);

        let directory = builder.pos();
        builder.u32(0); // no class annotations
        builder.u32(1); // one annotated field
        builder.u32(1); // one annotated method
        builder.u32(0); // no annotated parameters
        builder.u32(4); // field ordinal 4
        builder.u32(annotation_set);
        builder.u32(9); // method ordinal 9
        builder.u32(annotation_set);

        // Class data: counts, then fields (deltas 3, 1, 2), then methods (deltas 9, 2)
        let class_data = builder.pos();
        builder.uleb128(2); // static fields
        builder.uleb128(1); // instance fields
        builder.uleb128(1); // direct methods
        builder.uleb128(1); // virtual methods
        builder.uleb128(3); // field 3, static
        builder.uleb128(0x9); // PUBLIC | STATIC
        builder.uleb128(1); // field 4, static
        builder.uleb128(0x8); // STATIC
        builder.uleb128(2); // field 6, instance
        builder.uleb128(0x1); // PUBLIC
        builder.uleb128(9); // method 9, direct
        builder.uleb128(0x1); // PUBLIC
        builder.uleb128(0x400); // code offset (opaque)
        builder.uleb128(2); // method 11, virtual
        builder.uleb128(0x1); // PUBLIC
        builder.uleb128(0); // abstract: no code

        builder.align4();
        let class_def = builder.pos();
        builder.u32(0); // type LFoo;
        builder.u32(0x1); // PUBLIC
        builder.u32(1); // superclass Ljava/lang/Object;
        builder.u32(interfaces);
        builder.u32(4); // source file "Foo.java"
        builder.u32(directory);
        builder.u32(class_data);
        builder.u32(static_values);
        builder.class_defs(class_def, 1);

        let (data, header) = builder.finish();
        (data, header, class_def)
    }

    #[test]
    fn eager_fields() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, offset as usize).unwrap();
        assert_eq!(class.name(), "LFoo;");
        assert_eq!(class.access_flags(), AccessFlags::PUBLIC);
        assert_eq!(class.superclass(), Some("Ljava/lang/Object;"));
        assert_eq!(class.source_file(), Some("Foo.java"));
    }

    #[test]
    fn interfaces_resolve_in_order() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, offset as usize).unwrap();
        let interfaces = class.interfaces().unwrap();
        assert_eq!(interfaces.size(), 2);
        assert_eq!(interfaces.type_name(0).unwrap(), "Ljava/lang/Runnable;");
        assert_eq!(interfaces.type_name(1).unwrap(), "Ljava/io/Closeable;");
    }

    #[test]
    fn fields_decode_with_side_channels() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, offset as usize).unwrap();
        let fields = class.fields().unwrap();
        assert_eq!(fields.size(), 3);
        assert_eq!(fields.static_size(), 2);
        assert_eq!(fields.instance_size(), 1);

        let decoded: Vec<EncodedField> = fields
            .iter()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        assert_eq!(decoded[0].field_index(), 3);
        assert!(decoded[0].is_static());
        assert!(decoded[0].initial_value().is_some());
        assert!(decoded[0].annotations().unwrap().is_empty());

        assert_eq!(decoded[1].field_index(), 4);
        // Value array exhausted after one entry: default value
        assert!(decoded[1].initial_value().is_none());
        let annotations = decoded[1].annotations().unwrap();
        assert_eq!(annotations.size(), 1);
        assert_eq!(annotations.get(0).unwrap().type_name().unwrap(), "LMarker;");

        assert_eq!(decoded[2].field_index(), 6);
        assert!(!decoded[2].is_static());
        assert!(decoded[2].initial_value().is_none());
    }

    #[test]
    fn methods_follow_fields() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, offset as usize).unwrap();
        let methods = class.methods().unwrap();
        assert_eq!(methods.size(), 2);
        assert_eq!(methods.direct_size(), 1);
        assert_eq!(methods.virtual_size(), 1);

        let first = methods.get(0).unwrap();
        assert_eq!(first.method_index(), 9);
        assert_eq!(first.code_offset(), Some(0x400));
        assert_eq!(first.annotations().unwrap().size(), 1);

        let second = methods.get(1).unwrap();
        assert_eq!(second.method_index(), 11);
        assert_eq!(second.code_offset(), None);
        assert!(second.annotations().unwrap().is_empty());
    }

    #[test]
    fn skip_decode_equivalence() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);
        let class = ClassDef::read(dex, offset as usize).unwrap();
        let fields = class.fields().unwrap();

        // get(i) skips 0..i internally; results must match a sequential decode
        let sequential: Vec<(u32, u32)> = fields
            .iter()
            .unwrap()
            .map(|f| f.map(|f| (f.field_index(), f.access_flags().bits())))
            .collect::<Result<Vec<_>>>()
            .unwrap();

        for (index, expected) in sequential.iter().enumerate() {
            let field = fields.get(index as u32).unwrap();
            assert_eq!(
                (field.field_index(), field.access_flags().bits()),
                *expected
            );
        }
    }

    #[test]
    fn skip_preserves_annotation_alignment() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);
        let class = ClassDef::read(dex, offset as usize).unwrap();
        let fields = class.fields().unwrap();

        // Skip the first entry, decode the second: its annotation association
        // must match the eager traversal's
        let mut iter = fields.iter().unwrap();
        assert!(FieldIterator::skip(&mut iter).unwrap());
        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.field_index(), 4);
        assert_eq!(second.annotations().unwrap().size(), 1);

        // And the skipped entry must still have consumed one static value
        assert!(second.initial_value().is_none());
    }

    #[test]
    fn terminal_cursor_invariant() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);
        let class = ClassDef::read(dex, offset as usize).unwrap();
        let fields = class.fields().unwrap();

        // Any skip/decode mix must land the cursor on the same terminal offset
        let mut eager = fields.iter().unwrap();
        while eager.next().transpose().unwrap().is_some() {}

        let mut skipping = fields.iter().unwrap();
        while FieldIterator::skip(&mut skipping).unwrap() {}

        let mut mixed = fields.iter().unwrap();
        assert!(FieldIterator::skip(&mut mixed).unwrap());
        assert!(mixed.next().unwrap().is_ok());
        assert!(FieldIterator::skip(&mut mixed).unwrap());

        assert_eq!(eager.byte_offset(), skipping.byte_offset());
        assert_eq!(eager.byte_offset(), mixed.byte_offset());

        // The carried ordinal equals the last element's true index in every case
        assert_eq!(eager.previous_index(), 6);
        assert_eq!(skipping.previous_index(), 6);
        assert_eq!(mixed.previous_index(), 6);

        // The method stream starts exactly at that terminal offset
        let methods = class.methods().unwrap();
        let method_iter = methods.iter().unwrap();
        assert_eq!(method_iter.byte_offset(), eager.byte_offset());
    }

    #[test]
    fn restartability() {
        let (data, header, offset) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);
        let class = ClassDef::read(dex, offset as usize).unwrap();

        let collect = || -> Vec<(u32, u32, bool, u32)> {
            class
                .fields()
                .unwrap()
                .iter()
                .unwrap()
                .map(|f| {
                    let f = f.unwrap();
                    (
                        f.field_index(),
                        f.access_flags().bits(),
                        f.initial_value().is_some(),
                        f.annotations().unwrap().size(),
                    )
                })
                .collect()
        };

        // Two independent traversals over the same record view
        assert_eq!(collect(), collect());
    }

    #[test]
    fn absence_sentinels() {
        let mut builder = DexBuilder::new();
        builder.strings(&["LBare;"]);
        builder.types(&[0]);

        let class_def = builder.pos();
        builder.u32(0); // type LBare;
        builder.u32(0); // no flags
        builder.u32(0); // no superclass
        builder.u32(0); // no interfaces
        builder.u32(0); // no source file
        builder.u32(0); // no annotations
        builder.u32(0); // no class data
        builder.u32(0); // no static values
        builder.class_defs(class_def, 1);

        let (data, header) = builder.finish();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, class_def as usize).unwrap();
        assert_eq!(class.name(), "LBare;");
        assert_eq!(class.superclass(), None);
        assert_eq!(class.source_file(), None);
        assert!(class.interfaces().unwrap().is_empty());
        assert!(class.annotations().unwrap().is_empty());
        assert_eq!(class.fields().unwrap().size(), 0);
        assert_eq!(class.methods().unwrap().size(), 0);
        assert_eq!(class.fields().unwrap().iter().unwrap().count(), 0);
    }

    #[test]
    fn class_def_list_access() {
        let (data, header, _) = build_class();
        let dex = crate::metadata::DexData::new(&data, &header);

        let list = ClassDefList::new(dex);
        assert_eq!(list.size(), 1);

        let class = list.get(0).unwrap();
        assert_eq!(class.name(), "LFoo;");

        assert!(matches!(
            list.get(1),
            Err(crate::Error::IndexOutOfRange { index: 1, size: 1 })
        ));

        let names: Vec<String> = list
            .iter()
            .map(|c| c.map(|c| c.name().to_string()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(names, vec!["LFoo;".to_string()]);
    }

    #[test]
    fn truncated_class_data_fails_loudly() {
        let mut builder = DexBuilder::new();
        builder.strings(&["LBad;"]);
        builder.types(&[0]);

        // Class data declaring one field, but the entry bytes are missing:
        // place it at the very end of the buffer
        let class_def = builder.pos();
        builder.u32(0);
        builder.u32(0);
        builder.u32(0);
        builder.u32(0);
        builder.u32(0);
        builder.u32(0);
        let class_data_patch = builder.reserve_u32();
        builder.u32(0);
        builder.class_defs(class_def, 1);

        let class_data = builder.pos();
        builder.uleb128(1); // static fields
        builder.uleb128(0);
        builder.uleb128(0);
        builder.uleb128(0);
        builder.uleb128(3); // field delta, but its flags are missing
        builder.patch_u32(class_data_patch, class_data);

        let (data, header) = builder.finish();
        let dex = crate::metadata::DexData::new(&data, &header);

        let class = ClassDef::read(dex, class_def as usize).unwrap();
        let fields = class.fields().unwrap();
        assert_eq!(fields.size(), 1);

        let mut iter = fields.iter().unwrap();
        assert!(iter.next().unwrap().is_err());
        // Fused after the error
        assert!(iter.next().is_none());

        // Skipping fails identically
        let mut iter = fields.iter().unwrap();
        assert!(FieldIterator::skip(&mut iter).is_err());
    }
}
