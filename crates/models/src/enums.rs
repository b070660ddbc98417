//! String-backed enumerations stored in `VARCHAR` columns.
//!
//! Each enum round-trips through its lowercase wire name via [`Display`] and
//! [`FromStr`]; columns keep plain `String`s so rows written by older clients
//! with unknown values still load.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!("unsupported {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}

string_enum!(
    /// Subscriber plan tier. Declaration order is the upgrade order.
    PlanType {
        Gratuito => "gratuito",
        Essencial => "essencial",
        Premium => "premium",
        PremiumVip => "premium_vip",
    }
);

impl PlanType {
    /// Ordinal used for upgrade/downgrade comparison.
    pub fn rank(&self) -> u8 {
        match self {
            PlanType::Gratuito => 0,
            PlanType::Essencial => 1,
            PlanType::Premium => 2,
            PlanType::PremiumVip => 3,
        }
    }
}

impl Default for PlanType {
    fn default() -> Self { PlanType::Gratuito }
}

string_enum!(
    ProfileType {
        Empresarial => "empresarial",
        Profissional => "profissional",
    }
);

string_enum!(
    CategoryType {
        Commercial => "commercial",
        Professional => "professional",
        News => "news",
        Event => "event",
        Job => "job",
        Forum => "forum",
    }
);

string_enum!(
    /// Account role; every role except `Subscriber` may enter the back-office.
    Role {
        Master => "master",
        GeneralAdmin => "general_admin",
        ContentAdmin => "content_admin",
        Franchisee => "franchisee",
        Subscriber => "subscriber",
    }
);

impl Role {
    pub fn is_admin(&self) -> bool {
        !matches!(self, Role::Subscriber)
    }

    /// Roles allowed to read the audit log and activate contracts.
    pub fn is_platform_admin(&self) -> bool {
        matches!(self, Role::Master | Role::GeneralAdmin)
    }
}

string_enum!(
    SubscriberStatus {
        Active => "active",
        Inactive => "inactive",
    }
);

string_enum!(
    CommentStatus {
        Pending => "pending",
        Approved => "approved",
    }
);

string_enum!(
    CommentTarget {
        News => "news",
        Event => "event",
        Product => "product",
        Subscriber => "subscriber",
    }
);

string_enum!(
    OrderStatus {
        Pending => "pending",
        Paid => "paid",
        Shipped => "shipped",
        Delivered => "delivered",
        Canceled => "canceled",
    }
);

impl OrderStatus {
    /// Allowed forward transitions; `Canceled` is reachable until shipping.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Canceled) | (Paid, Shipped) | (Paid, Canceled) | (Shipped, Delivered)
        )
    }
}

string_enum!(
    /// Simulated payment method; no gateway integration.
    PaymentMethod {
        Pix => "pix",
        Boleto => "boleto",
        Card => "card",
    }
);

string_enum!(
    ContractStatus {
        Pending => "pending",
        Active => "active",
        Canceled => "canceled",
    }
);
