//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Lowercase name as seeded in the lookup table.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Look up a variant by its lookup-table name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Worker profile lifecycle.
    CvStatus {
        Available = 1 => "available",
        Reserved = 2 => "reserved",
        InProcess = 3 => "in_process",
        Deployed = 4 => "deployed",
        Withdrawn = 5 => "withdrawn",
    }
}

define_status_enum! {
    /// Job posting status.
    JobStatus {
        Open = 1 => "open",
        Closed = 2 => "closed",
    }
}

define_status_enum! {
    /// Offer (reservation request) status.
    OfferStatus {
        Pending = 1 => "pending",
        Accepted = 2 => "accepted",
        Rejected = 3 => "rejected",
        Cancelled = 4 => "cancelled",
        Expired = 5 => "expired",
    }
}

define_status_enum! {
    /// Management transfer status.
    TransferStatus {
        Pending = 1 => "pending",
        Accepted = 2 => "accepted",
        Rejected = 3 => "rejected",
        Cancelled = 4 => "cancelled",
    }
}

define_status_enum! {
    /// Manually recorded payment review status.
    PaymentStatus {
        Pending = 1 => "pending",
        Confirmed = 2 => "confirmed",
        Rejected = 3 => "rejected",
    }
}
