/// Run `$body` with `$v` bound to the typed vector inside a [`Buffer`].
///
/// `$buf` must evaluate to `&Buffer` or `&mut Buffer`; `$v` gets the
/// matching `&Vec<T>` / `&mut Vec<T>`.
///
/// [`Buffer`]: crate::storage::Buffer
#[macro_export]
macro_rules! with_buffer {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            $crate::storage::Buffer::Bool($v) => $body,
            $crate::storage::Buffer::U8($v) => $body,
            $crate::storage::Buffer::I16($v) => $body,
            $crate::storage::Buffer::U16($v) => $body,
            $crate::storage::Buffer::I32($v) => $body,
            $crate::storage::Buffer::U32($v) => $body,
            $crate::storage::Buffer::I64($v) => $body,
            $crate::storage::Buffer::U64($v) => $body,
            $crate::storage::Buffer::F32($v) => $body,
            $crate::storage::Buffer::F64($v) => $body,
        }
    };
}

/// Run `$body` with the type alias `$t` naming the Rust type of `$dtype`.
#[macro_export]
macro_rules! with_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            $crate::DType::Bool => {
                type $t = bool;
                $body
            }
            $crate::DType::U8 => {
                type $t = u8;
                $body
            }
            $crate::DType::I16 => {
                type $t = i16;
                $body
            }
            $crate::DType::U16 => {
                type $t = u16;
                $body
            }
            $crate::DType::I32 => {
                type $t = i32;
                $body
            }
            $crate::DType::U32 => {
                type $t = u32;
                $body
            }
            $crate::DType::I64 => {
                type $t = i64;
                $body
            }
            $crate::DType::U64 => {
                type $t = u64;
                $body
            }
            $crate::DType::F32 => {
                type $t = f32;
                $body
            }
            $crate::DType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}

/// Like [`with_dtype!`] for the numeric dtypes; `Bool` evaluates `$bool`.
#[macro_export]
macro_rules! with_num_dtype {
    ($dtype:expr, $t:ident => $body:expr, bool => $bool:expr) => {
        match $dtype {
            $crate::DType::Bool => $bool,
            $crate::DType::U8 => {
                type $t = u8;
                $body
            }
            $crate::DType::I16 => {
                type $t = i16;
                $body
            }
            $crate::DType::U16 => {
                type $t = u16;
                $body
            }
            $crate::DType::I32 => {
                type $t = i32;
                $body
            }
            $crate::DType::U32 => {
                type $t = u32;
                $body
            }
            $crate::DType::I64 => {
                type $t = i64;
                $body
            }
            $crate::DType::U64 => {
                type $t = u64;
                $body
            }
            $crate::DType::F32 => {
                type $t = f32;
                $body
            }
            $crate::DType::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}
