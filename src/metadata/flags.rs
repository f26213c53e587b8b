//! Access flag bitmasks for classes, fields and methods.

use bitflags::bitflags;

bitflags! {
    /// Dalvik access flags, shared across classes, fields and methods.
    ///
    /// Some bits are overloaded by member kind: `0x40` means `VOLATILE` on a
    /// field but `BRIDGE` on a method, and `0x80` means `TRANSIENT` on a field
    /// but `VARARGS` on a method. Both names are defined; interpreting them
    /// correctly is up to the caller's context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        /// Visible everywhere
        const PUBLIC = 0x0001;
        /// Only visible to the defining class
        const PRIVATE = 0x0002;
        /// Visible to the package and subclasses
        const PROTECTED = 0x0004;
        /// Per-class rather than per-instance
        const STATIC = 0x0008;
        /// Not mutable / not overridable / not subclassable
        const FINAL = 0x0010;
        /// Associated lock acquired around method invocation
        const SYNCHRONIZED = 0x0020;
        /// Field: special access rules to help with thread safety
        const VOLATILE = 0x0040;
        /// Method: compiler-generated bridge
        const BRIDGE = 0x0040;
        /// Field: not saved by default serialization
        const TRANSIENT = 0x0080;
        /// Method: last argument is treated as a "rest" argument
        const VARARGS = 0x0080;
        /// Implemented in native code
        const NATIVE = 0x0100;
        /// Interface class
        const INTERFACE = 0x0200;
        /// Not directly instantiable
        const ABSTRACT = 0x0400;
        /// Strict floating-point arithmetic
        const STRICT = 0x0800;
        /// Not directly present in the source code
        const SYNTHETIC = 0x1000;
        /// Annotation class
        const ANNOTATION = 0x2000;
        /// Enumerated type or value
        const ENUM = 0x4000;
        /// Constructor method
        const CONSTRUCTOR = 0x0001_0000;
        /// Method declared `synchronized` in the source
        const DECLARED_SYNCHRONIZED = 0x0002_0000;
    }
}

impl AccessFlags {
    /// Interpret a raw flag word, keeping any bits this library does not know about.
    ///
    /// Unknown bits are preserved rather than rejected so that flag words round-trip
    /// through [`AccessFlags::bits`] unchanged.
    #[must_use]
    pub fn from_raw(value: u32) -> AccessFlags {
        AccessFlags::from_bits_retain(value)
    }
}
