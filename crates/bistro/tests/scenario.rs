use bistro::{LatencyRange, Restaurant, RestaurantConfig, RestaurantState, Timings};
use core::time::Duration;
use std::sync::Arc;
use tokio::time::sleep;

fn busy_config() -> RestaurantConfig {
    RestaurantConfig {
        counter_capacity: 3,
        cooks: 2,
        waiters: 2,
        tables: 8,
        arrival_probability: 0.0,
        ..Default::default()
    }
}

fn assert_consistent(restaurant: &Restaurant) {
    let state = restaurant.state();
    assert!(state.occupancy <= state.capacity, "{state:?}");
    assert!(state.served_total <= state.produced_total, "{state:?}");

    for table in restaurant.tables() {
        if table.has_dish {
            assert!(table.active_customers > 0, "{table:?}");
        }
        assert!((0.0..=1.0).contains(&table.patience_ratio), "{table:?}");
    }
}

/// Sleeps for `total`, checking the invariants every 100ms along the way.
async fn watch(restaurant: &Restaurant, total: Duration) {
    let step = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < total {
        sleep(step).await;
        waited += step;
        assert_consistent(restaurant);
    }
}

#[tokio::test(start_paused = true)]
async fn demand_drives_production_and_pause_stops_it() {
    let restaurant = Restaurant::new(busy_config()).unwrap();
    restaurant.start().unwrap();

    watch(&restaurant, Duration::from_secs(2)).await;
    assert_eq!(restaurant.state().produced_total, 0);

    restaurant.add_customers(5);
    assert_eq!(restaurant.state().active_customers, 5);

    watch(&restaurant, Duration::from_secs(5)).await;
    let state = restaurant.state();
    assert!(state.produced_total > 0, "{state:?}");
    assert!(state.served_total > 0, "{state:?}");

    let idle_poll = restaurant.config().timings.idle_poll;
    for _ in 0..2 {
        assert!(restaurant.toggle_pause());
        let paused_at = restaurant.state().produced_total;

        // Dishes still on the stove are dropped, so the total freezes well
        // within one idle poll and stays frozen.
        let mut waited = Duration::ZERO;
        while waited < idle_poll * 6 {
            sleep(Duration::from_millis(50)).await;
            waited += Duration::from_millis(50);
            assert_consistent(&restaurant);
            assert_eq!(
                restaurant.state().produced_total,
                paused_at,
                "produced after {waited:?} paused"
            );
        }

        assert!(!restaurant.toggle_pause());
        watch(&restaurant, Duration::from_secs(5)).await;
        let state = restaurant.state();
        assert!(state.produced_total > paused_at, "{state:?}");
    }
    let state = restaurant.state();
    // Nobody has waited 30s yet.
    assert_eq!(state.lost_customers, 0);
    assert_eq!(state.active_customers, 5);

    restaurant.close().await;
    assert_eq!(restaurant.running_tasks(), 0);
}

#[tokio::test(start_paused = true)]
async fn removing_everyone_stops_the_cooks() {
    let restaurant = Restaurant::new(busy_config()).unwrap();
    restaurant.start().unwrap();
    restaurant.add_customers(4);

    watch(&restaurant, Duration::from_secs(6)).await;
    assert_eq!(restaurant.remove_customers(10), 4);
    assert_eq!(restaurant.state().active_customers, 0);

    // One more dish per cook may still be on the stove.
    watch(&restaurant, Duration::from_secs(3)).await;
    let settled = restaurant.state().produced_total;
    watch(&restaurant, Duration::from_secs(5)).await;
    assert_eq!(restaurant.state().produced_total, settled);
    assert_eq!(restaurant.state().lost_customers, 0);

    restaurant.close().await;
}

#[tokio::test(start_paused = true)]
async fn unattended_tables_lose_their_customers() {
    let config = RestaurantConfig {
        waiters: 0,
        timings: Timings {
            patience: Duration::from_secs(5),
            ..Default::default()
        },
        ..busy_config()
    };
    let restaurant = Restaurant::new(config).unwrap();
    restaurant.start().unwrap();
    restaurant.add_customers(10);

    watch(&restaurant, Duration::from_secs(7)).await;
    let state = restaurant.state();
    assert_eq!(state.lost_customers, 10);
    assert_eq!(state.active_customers, 0);
    // The counter filled up and nobody took anything off it.
    assert_eq!(state.occupancy, 3);
    assert_eq!(state.served_total, 0);

    restaurant.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hand_delivery_races_background_tasks() {
    let config = RestaurantConfig {
        counter_capacity: 2,
        cooks: 3,
        waiters: 0,
        tables: 4,
        arrival_probability: 1.0,
        max_party_size: 2,
        timings: Timings {
            cook_time: LatencyRange::new(Duration::from_millis(2), Duration::from_millis(5)),
            idle_poll: Duration::from_millis(5),
            patience: Duration::from_millis(400),
            patience_tick: Duration::from_millis(20),
            arrival_interval: Duration::from_millis(50),
            clear_delay: Duration::from_millis(30),
            ..Default::default()
        },
        ..Default::default()
    };
    let restaurant = Arc::new(Restaurant::new(config).unwrap());
    restaurant.start().unwrap();

    let runner = {
        let restaurant = Arc::clone(&restaurant);
        tokio::spawn(async move {
            let mut delivered = 0_u64;
            for _ in 0..200 {
                if let Some(dish) = restaurant.try_consume() {
                    let target = restaurant.tables().into_iter().find(|t| {
                        t.active_customers > 0 && !t.has_dish
                    });
                    let position = target.map_or(bistro::FIRST_TABLE, |t| t.position);
                    if restaurant.deliver(dish, position, 10.0).is_ok() {
                        delivered += 1;
                    }
                }
                assert_consistent(&restaurant);
                sleep(Duration::from_millis(3)).await;
            }
            delivered
        })
    };

    let delivered = runner.await.unwrap();
    restaurant.close().await;

    let state: RestaurantState = restaurant.state();
    assert_eq!(state.served_total, delivered);
    assert!(state.produced_total >= state.served_total);
    assert_eq!(restaurant.running_tasks(), 0);
    assert_consistent(&restaurant);
}
