//! Convenient re-exports of the most commonly used types.
//!
//! ```rust,no_run
//! use dexscope::prelude::*;
//!
//! let dex = DexFile::from_file("classes.dex".as_ref())?;
//! for class in dex.class_defs().iter() {
//!     println!("{}", class?.name());
//! }
//! # Ok::<(), dexscope::Error>(())
//! ```

pub use crate::{
    metadata::{
        annotations::{Annotation, AnnotationSetList, AnnotationVisibility},
        classes::{ClassDef, ClassDefList, EncodedField, EncodedMethod, FieldList, MethodList},
        flags::AccessFlags,
        header::DexHeader,
        pools::{StringPool, TypePool},
        tables::{TypeItem, TypeList},
        values::{EncodedValueRef, ValueType},
        DexData,
    },
    DexFile, Error, Parser, Result,
};
