//! Vehicle pool bookkeeping tests

use parking_sim::simulation::{VehicleId, VehiclePool};

#[test]
fn test_new_pool_is_all_inactive() {
    let pool = VehiclePool::with_capacity(3);
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.pooled_len(), 3);
    assert_eq!(pool.active_len(), 0);
    assert!(pool.active().is_empty());
}

#[test]
fn test_checkout_and_checkin_are_fifo() {
    let mut pool = VehiclePool::with_capacity(3);

    assert_eq!(pool.checkout(), Some(VehicleId(0)));
    assert_eq!(pool.checkout(), Some(VehicleId(1)));
    assert_eq!(pool.active(), &[VehicleId(0), VehicleId(1)]);
    assert!(pool.is_active(VehicleId(0)));

    pool.checkin(VehicleId(0));
    assert!(!pool.is_active(VehicleId(0)));
    assert_eq!(pool.active(), &[VehicleId(1)]);

    // Id 2 has waited longest, the returned id goes to the back
    assert_eq!(pool.checkout(), Some(VehicleId(2)));
    assert_eq!(pool.checkout(), Some(VehicleId(0)));
    assert_eq!(pool.checkout(), None);
    assert_eq!(pool.capacity(), 3);
}

#[test]
fn test_checkin_of_inactive_id_changes_nothing() {
    let mut pool = VehiclePool::with_capacity(2);
    let id = pool.checkout().expect("pool has a vehicle");

    pool.checkin(id);
    pool.checkin(id);
    pool.checkin(VehicleId(7));

    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.pooled_len(), 2);
    assert_eq!(pool.active_len(), 0);
}
