use crate::error::{map_core_error, set_last_error};
use crate::handle::INVENTORIES;
use crate::types::*;
use home_inventory_core::Inventory;
use std::ffi::c_char;

/// Create an in-memory inventory, optionally seeded with demo items.
#[no_mangle]
pub extern "C" fn hi_inventory_create(seed_demo: bool) -> u64 {
    let inventory = if seed_demo {
        Inventory::with_demo_items()
    } else {
        Inventory::new()
    };
    INVENTORIES.allocate(inventory)
}

#[no_mangle]
pub extern "C" fn hi_inventory_destroy(handle: u64) -> HiResultCode {
    if INVENTORIES.destroy(handle) {
        HiResultCode::Ok
    } else {
        set_last_error("Invalid handle".to_string());
        HiResultCode::InvalidHandle
    }
}

/// Number of items, or 0 for an unknown handle.
#[no_mangle]
pub extern "C" fn hi_inventory_count(handle: u64) -> u32 {
    INVENTORIES
        .with(handle, |inventory| inventory.len() as u32)
        .unwrap_or(0)
}

/// Add an item for a scanned barcode. `out_added` (optional) is false when
/// the barcode was already in the list.
///
/// # Safety
/// `barcode` must be a valid C string; `out_added` null or valid.
#[no_mangle]
pub unsafe extern "C" fn hi_inventory_add(
    handle: u64,
    barcode: *const c_char,
    out_added: *mut bool,
) -> HiResultCode {
    let barcode = match c_string_to_rust(barcode) {
        Some(s) if !s.is_empty() => s,
        _ => {
            set_last_error("barcode is null or empty".to_string());
            return HiResultCode::InvalidArgument;
        }
    };

    let result = INVENTORIES.with(handle, |inventory| {
        let added = inventory.add_item(&barcode).is_some();
        if !out_added.is_null() {
            *out_added = added;
        }
        HiResultCode::Ok
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Copy the item at `index` into `out_item`. Release it with `hi_item_free`.
///
/// # Safety
/// `out_item` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn hi_inventory_get(
    handle: u64,
    index: u32,
    out_item: *mut HiItem,
) -> HiResultCode {
    if out_item.is_null() {
        set_last_error("out_item is null".to_string());
        return HiResultCode::InvalidArgument;
    }

    let result = INVENTORIES.with(handle, |inventory| match inventory.get(index as usize) {
        Some(item) => {
            *out_item = HiItem {
                id: rust_string_to_c(&item.id.to_string()),
                name: rust_string_to_c(&item.name),
                barcode: rust_string_to_c(&item.barcode),
                date_added: item.date_added.timestamp(),
                order: item.order as u32,
            };
            HiResultCode::Ok
        }
        None => {
            set_last_error(format!("No item at index {}", index));
            HiResultCode::NotFound
        }
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Free the strings of an item filled by `hi_inventory_get`.
///
/// # Safety
/// `item` must be null or point to an item filled by this library.
#[no_mangle]
pub unsafe extern "C" fn hi_item_free(item: *mut HiItem) {
    if item.is_null() {
        return;
    }
    let item = &mut *item;
    for field in [&mut item.id, &mut item.name, &mut item.barcode] {
        crate::error::hi_free_string(*field);
        *field = std::ptr::null_mut();
    }
}

/// # Safety
/// `name` must be a valid C string.
#[no_mangle]
pub unsafe extern "C" fn hi_inventory_rename(
    handle: u64,
    index: u32,
    name: *const c_char,
) -> HiResultCode {
    let Some(name) = c_string_to_rust(name) else {
        set_last_error("name is null".to_string());
        return HiResultCode::InvalidArgument;
    };

    let result = INVENTORIES.with(handle, |inventory| {
        let Some(id) = inventory.get(index as usize).map(|item| item.id) else {
            set_last_error(format!("No item at index {}", index));
            return HiResultCode::NotFound;
        };
        match inventory.rename(id, &name) {
            Ok(()) => HiResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

/// Remove the items at the given list positions.
///
/// # Safety
/// `indices` must point to `count` values; `out_removed` null or valid.
#[no_mangle]
pub unsafe extern "C" fn hi_inventory_remove_at(
    handle: u64,
    indices: *const u32,
    count: u32,
    out_removed: *mut u32,
) -> HiResultCode {
    if indices.is_null() && count > 0 {
        set_last_error("indices is null".to_string());
        return HiResultCode::InvalidArgument;
    }

    let positions: Vec<usize> = (0..count as usize)
        .map(|i| *indices.add(i) as usize)
        .collect();

    let result = INVENTORIES.with(handle, |inventory| {
        let removed = inventory.remove_at(&positions);
        if !out_removed.is_null() {
            *out_removed = removed as u32;
        }
        HiResultCode::Ok
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}

#[no_mangle]
pub extern "C" fn hi_inventory_move(handle: u64, from: u32, to: u32) -> HiResultCode {
    let result = INVENTORIES.with(handle, |inventory| {
        if inventory.move_item(from as usize, to as usize) {
            HiResultCode::Ok
        } else {
            set_last_error(format!("Cannot move item {} to {}", from, to));
            HiResultCode::InvalidArgument
        }
    });

    result.unwrap_or(HiResultCode::InvalidHandle)
}
