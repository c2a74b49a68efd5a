//! Carriers hauling resource units from resource nodes to where they are
//! needed.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    ops::ControlFlow,
};

use setlerio_core::{
    CarrierId, DrawPriority, Event, HexCoord, Occupant, ResourceCounts, ResourceKind,
};
use tracing::{debug, info};

use crate::{
    drawables::{DrawKind, DrawableHandle},
    scheduler::{EventDuration, EventProgress},
    World,
};

/// Read-only view of a carrier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarrierView {
    /// Identifier of the carrier.
    pub id: CarrierId,
    /// Tile the carrier last stood on.
    pub position: HexCoord,
    /// Trip in progress, if any.
    pub trip: Option<TripView>,
}

/// Read-only view of a carrier's trip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TripView {
    /// Resource node the unit was taken from.
    pub source: HexCoord,
    /// Tile the unit is delivered to.
    pub destination: HexCoord,
    /// Kind of the carried unit.
    pub resource: ResourceKind,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f64,
}

#[derive(Debug)]
struct Carrier {
    position: HexCoord,
    trip: Option<TripView>,
}

#[derive(Debug)]
struct Need {
    destination: HexCoord,
    remaining: ResourceCounts,
}

/// Carrier pool and outstanding hauling requests.
#[derive(Debug, Default)]
pub(crate) struct Logistics {
    carriers: BTreeMap<CarrierId, Carrier>,
    needs: VecDeque<Need>,
    drawable: Option<DrawableHandle>,
}

impl Logistics {
    pub(crate) fn views(&self) -> Vec<CarrierView> {
        self.carriers
            .iter()
            .map(|(id, carrier)| CarrierView {
                id: *id,
                position: carrier.position,
                trip: carrier.trip,
            })
            .collect()
    }

    pub(crate) fn outstanding(&self) -> ResourceCounts {
        let mut total = ResourceCounts::default();
        for need in &self.needs {
            total.add(&need.remaining);
        }
        total
    }

    fn free_carriers_at(&self, hex: HexCoord) -> impl Iterator<Item = CarrierId> + '_ {
        self.carriers
            .iter()
            .filter(move |(_, carrier)| carrier.trip.is_none() && carrier.position == hex)
            .map(|(id, _)| *id)
    }

    fn has_free_carrier(&self) -> bool {
        self.carriers.values().any(|carrier| carrier.trip.is_none())
    }
}

/// Share of a resource node assigned to a single need.
struct Reservation {
    source: HexCoord,
    resource: ResourceKind,
    units: u32,
}

impl World {
    /// Asks carriers to bring `counts` to `destination`.
    pub fn request_haul(&mut self, destination: HexCoord, counts: ResourceCounts) {
        if counts.is_empty() {
            return;
        }
        debug!(%destination, ?counts, "haul requested");
        self.logistics.needs.push_back(Need {
            destination,
            remaining: counts,
        });
    }

    /// Spawns the carrier pool at the first influence owner.
    pub(crate) fn spawn_carriers(&mut self, hex: HexCoord) {
        if !self.logistics.carriers.is_empty() || self.config.carriers == 0 {
            return;
        }
        for id in 0..self.config.carriers {
            let _ = self.logistics.carriers.insert(
                CarrierId::new(id),
                Carrier {
                    position: hex,
                    trip: None,
                },
            );
        }
        self.logistics.drawable = Some(self.drawables.push(
            DrawPriority::Buildings,
            DrawKind::CarrierTrips,
            None,
        ));
        info!(%hex, count = self.config.carriers, "carriers spawned");
        self.emit(Event::CarriersSpawned {
            hex,
            count: self.config.carriers,
        });
    }

    /// Assigns free carriers to outstanding needs.
    pub(crate) fn dispatch_hauls(&mut self) {
        let mut needs = std::mem::take(&mut self.logistics.needs);
        for need in needs.iter_mut() {
            if !self.logistics.has_free_carrier() {
                break;
            }
            for reservation in self.reserve_units(need.destination, &need.remaining) {
                let dispatched = self.dispatch_units(need.destination, &reservation);
                *need.remaining.get_mut(reservation.resource) -= dispatched;
            }
        }
        needs.retain(|need| !need.remaining.is_empty());
        needs.append(&mut self.logistics.needs);
        self.logistics.needs = needs;
    }

    /// Finds resource nodes closest to `destination` that together cover as
    /// much of `wanted` as possible.
    fn reserve_units(&self, destination: HexCoord, wanted: &ResourceCounts) -> Vec<Reservation> {
        let mut remaining = *wanted;
        let mut seen = BTreeSet::new();
        let mut reservations = Vec::new();

        let _ = self.path_find(destination, |hex| {
            if !seen.insert(hex) {
                return ControlFlow::Continue(());
            }
            let Some(Occupant::ResourceNode(stock)) = self.occupant(hex) else {
                return ControlFlow::Continue(());
            };
            for (resource, available) in stock.iter() {
                let slot = remaining.get_mut(resource);
                let units = available.min(*slot);
                if units > 0 {
                    *slot -= units;
                    reservations.push(Reservation {
                        source: hex,
                        resource,
                        units,
                    });
                }
            }
            if remaining.is_empty() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        reservations
    }

    /// Sends the closest free carriers after the reserved units and returns
    /// how many were dispatched.
    fn dispatch_units(&mut self, destination: HexCoord, reservation: &Reservation) -> u32 {
        let wanted = usize::try_from(reservation.units).unwrap_or(usize::MAX);
        let carriers = self.closest_free_carriers(reservation.source, wanted);
        let mut dispatched = 0;

        for carrier in carriers {
            if !self.take_unit(reservation.source, reservation.resource) {
                break;
            }
            self.start_trip(carrier, reservation.source, destination, reservation.resource);
            dispatched += 1;
        }
        dispatched
    }

    fn closest_free_carriers(&self, source: HexCoord, wanted: usize) -> Vec<CarrierId> {
        let mut found: Vec<CarrierId> = self
            .logistics
            .free_carriers_at(source)
            .take(wanted)
            .collect();
        if found.len() >= wanted {
            return found;
        }

        let mut seen = BTreeSet::from([source]);
        let _ = self.path_find(source, |hex| {
            if seen.insert(hex) {
                let missing = wanted - found.len();
                found.extend(self.logistics.free_carriers_at(hex).take(missing));
            }
            if found.len() >= wanted {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Removes one unit from a resource node. Emptied nodes become blank.
    fn take_unit(&mut self, source: HexCoord, resource: ResourceKind) -> bool {
        let Some(Occupant::ResourceNode(mut stock)) = self.occupant(source).copied() else {
            return false;
        };
        let slot = stock.get_mut(resource);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;

        let occupant = if stock.is_empty() {
            Occupant::Blank
        } else {
            Occupant::ResourceNode(stock)
        };
        let _ = self.set_occupant(source, occupant, true);
        true
    }

    fn start_trip(
        &mut self,
        carrier: CarrierId,
        source: HexCoord,
        destination: HexCoord,
        resource: ResourceKind,
    ) {
        let Some(from) = self
            .logistics
            .carriers
            .get(&carrier)
            .map(|state| state.position)
        else {
            return;
        };
        let steps = u64::from(from.steps_to(source) + source.steps_to(destination)).max(1);
        let duration = self.ticks_for(self.config.carrier_step_ms.saturating_mul(steps));
        let _ = self.schedule(
            0,
            EventDuration::Ticks(duration),
            Box::new(move |world: &mut World, progress| world.advance_trip(carrier, progress)),
        );
        if let Some(state) = self.logistics.carriers.get_mut(&carrier) {
            state.trip = Some(TripView {
                source,
                destination,
                resource,
                progress: 0.0,
            });
        }

        debug!(carrier = carrier.get(), %from, %source, %destination, ?resource, "carrier dispatched");
        self.emit(Event::CarrierDispatched {
            carrier,
            from,
            source,
            destination,
            resource,
        });
    }

    fn advance_trip(&mut self, carrier: CarrierId, progress: EventProgress) {
        let Some(state) = self.logistics.carriers.get_mut(&carrier) else {
            return;
        };
        let Some(trip) = state.trip.as_mut() else {
            return;
        };
        trip.progress = progress.fraction();
        if !progress.is_final() {
            return;
        }

        let TripView {
            destination,
            resource,
            ..
        } = *trip;
        state.position = destination;
        state.trip = None;
        self.ledger
            .credit(&ResourceCounts::single(resource, 1));

        debug!(carrier = carrier.get(), %destination, ?resource, "haul delivered");
        self.emit(Event::HaulDelivered {
            carrier,
            destination,
            resource,
        });
    }
}
