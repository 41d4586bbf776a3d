// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Progress output that the libtest harness cannot swallow.

use std::{
    fs,
    os::fd::FromRawFd,
    sync::{LazyLock, Mutex},
};

/* <Forgive me father for I have sinned> */

// TODO: make cross-platform
#[doc(hidden)]
pub static STDERR: LazyLock<Mutex<fs::File>> =
    LazyLock::new(|| Mutex::new(unsafe { fs::File::from_raw_fd(2) }));

/* </Forgive me father for I have sinned> */

/// Like `eprintln!`, but written straight to file descriptor 2 so it shows
/// up even while `cargo test` captures output. Evaluates to a
/// `Result<(), snafu::Whatever>`.
#[macro_export]
macro_rules! eprintln_nocapture {
    ($($contents:tt)*) => {{
        use ::std::io::Write as _;
        use $crate::__reexports::snafu::{
            FromString as _, ResultExt as _, Whatever,
        };

        let result: ::std::result::Result<(), Whatever> =
            match $crate::nocapture::STDERR.lock() {
                Ok(mut stderr) => writeln!(&mut *stderr, $($contents)*)
                    .whatever_context("Failed to write to non-captured stderr"),
                Err(_) => Err(Whatever::without_source(
                    "Non-captured stderr lock was poisoned".into(),
                )),
            };
        result
    }};
}
