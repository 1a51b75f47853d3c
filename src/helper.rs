// return a diagnostic located at token `$at` from an analysis rule
#[macro_export]
macro_rules! error {
	($ctx:expr, $at:expr, $kind:expr) => {
		return Err($ctx.error($at, $kind))
	};
}

#[macro_export]
macro_rules! mismatch {
	($($tt:tt)*) => {
		$crate::frontend::diagnostic::ErrorKind::TypeMismatch(format!($($tt)*))
	};
}

#[macro_export]
macro_rules! malformed {
	($($tt:tt)*) => {
		$crate::frontend::diagnostic::ErrorKind::MalformedDeclarator(format!($($tt)*))
	};
}
