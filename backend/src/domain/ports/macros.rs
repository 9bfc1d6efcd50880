//! Helper macro generating port error enums with snake_case constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::time::Duration;

    define_port_error! {
        pub enum ExamplePortError {
            Missing { message: String } => "missing: {message}",
            Status { status: u16 } => "status: {status}",
            Delayed { message: String, retry_after: Option<Duration> } =>
                "delayed: {message} ({retry_after:?})",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ExamplePortError::missing("api key");
        assert_eq!(err.to_string(), "missing: api key");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = ExamplePortError::status(503_u16);
        assert_eq!(err.to_string(), "status: 503");
    }

    #[test]
    fn constructors_accept_bare_values_for_option_fields() {
        let err = ExamplePortError::delayed("slow", Duration::from_secs(2));
        assert_eq!(
            err,
            ExamplePortError::Delayed {
                message: "slow".to_owned(),
                retry_after: Some(Duration::from_secs(2)),
            }
        );
    }
}
