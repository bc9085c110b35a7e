//! Runnable demos for the CobaltFIX engine; see the `examples/` directory.
