use crate::distance::DistanceIndex;
use crate::domain::types::LocationId;

/// Length of a closed tour that leaves `hub`, visits `stops` in order and returns.
pub fn tour_distance(hub: LocationId, stops: &[LocationId], dm: &DistanceIndex) -> f64 {
    if stops.is_empty() {
        return 0.0;
    }

    let hub_to_first_stop = dist_between(hub, stops[0], dm);
    let last_stop_to_hub = dist_between(stops[stops.len() - 1], hub, dm);

    let mut total_dist = 0.0;
    for i in 0..stops.len() - 1 {
        total_dist += dist_between(stops[i], stops[i + 1], dm);
    }

    hub_to_first_stop + total_dist + last_stop_to_hub
}

/// Sum of consecutive hops along an explicit route.
pub fn route_distance(route: &[LocationId], dm: &DistanceIndex) -> f64 {
    route
        .windows(2)
        .map(|hop| dist_between(hop[0], hop[1], dm))
        .sum()
}

pub fn dist_between(from_loc: LocationId, to_loc: LocationId, dm: &DistanceIndex) -> f64 {
    dm.distance(from_loc, to_loc)
}
