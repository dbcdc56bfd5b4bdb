//! Static hosting package catalog
//!
//! The storefront sells a fixed set of tiers. The catalog is compiled in,
//! loaded once, and only ever read; exactly one entry carries the
//! most-popular flag.

use serde::Serialize;

/// A purchasable hosting tier
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Package {
    pub id: &'static str,
    /// Memory in GB
    pub ram: u32,
    /// Disk in GB
    pub disk: u32,
    /// CPU allowance in percent of one core
    pub cpu: u32,
    /// Price in whole IDR
    pub price: u64,
    /// Most-popular badge in the storefront
    pub is_top: bool,
}

/// All purchasable tiers
pub const PACKAGES: &[Package] = &[
    Package {
        id: "1gb",
        ram: 1,
        disk: 2,
        cpu: 50,
        price: 10_000,
        is_top: false,
    },
    Package {
        id: "2gb",
        ram: 2,
        disk: 4,
        cpu: 75,
        price: 15_000,
        is_top: false,
    },
    Package {
        id: "3gb",
        ram: 3,
        disk: 6,
        cpu: 100,
        price: 20_000,
        is_top: false,
    },
    Package {
        id: "4gb",
        ram: 4,
        disk: 8,
        cpu: 125,
        price: 25_000,
        is_top: true,
    },
    Package {
        id: "6gb",
        ram: 6,
        disk: 12,
        cpu: 150,
        price: 35_000,
        is_top: false,
    },
    Package {
        id: "8gb",
        ram: 8,
        disk: 16,
        cpu: 200,
        price: 45_000,
        is_top: false,
    },
];

/// Look up a package by id
pub fn find_package(id: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|pkg| pkg.id == id)
}
