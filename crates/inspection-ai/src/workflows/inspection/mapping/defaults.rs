use crate::workflows::inspection::domain::Trade;

pub(super) const STANDARD_LABELS: &[(&str, Trade)] = &[
    // Trade names as exported by the inspection app
    ("Appliances", Trade::Appliances),
    ("Carpentry & Joinery", Trade::CarpentryAndJoinery),
    ("Carpentry and Joinery", Trade::CarpentryAndJoinery),
    ("Doors", Trade::Doors),
    ("Electrical", Trade::Electrical),
    ("Flooring - Carpets", Trade::FlooringCarpets),
    ("Flooring - Tiles", Trade::FlooringTiles),
    ("Flooring - Timber", Trade::FlooringTimber),
    ("Painting", Trade::Painting),
    ("Plumbing", Trade::Plumbing),
    ("Windows", Trade::Windows),
    // Common shorthand from site inspectors
    ("Carpentry", Trade::CarpentryAndJoinery),
    ("Joinery", Trade::CarpentryAndJoinery),
    ("Cabinetry", Trade::CarpentryAndJoinery),
    ("Electrician", Trade::Electrical),
    ("Elec", Trade::Electrical),
    ("Plumber", Trade::Plumbing),
    ("Painter", Trade::Painting),
    ("Glazing", Trade::Windows),
    ("Tiling", Trade::FlooringTiles),
    ("Tiles", Trade::FlooringTiles),
    ("Carpet", Trade::FlooringCarpets),
    ("Carpets", Trade::FlooringCarpets),
    ("Timber Flooring", Trade::FlooringTimber),
    // Room / component pairs from the master mapping sheet
    ("Apartment Entry Door / Door Handle", Trade::Doors),
    ("Apartment Entry Door / Door Locks and Keys", Trade::Doors),
    ("Apartment Entry Door / Paint", Trade::Painting),
    ("Balcony / Balustrade", Trade::CarpentryAndJoinery),
    ("Balcony / Drainage Point", Trade::Plumbing),
    ("Balcony / Glass Sliding Door", Trade::Windows),
    ("Balcony / Tiles", Trade::FlooringTiles),
    ("Bathroom / Exhaust Fan", Trade::Electrical),
    ("Bathroom / Light Fixtures", Trade::Electrical),
    ("Bathroom / Mirror", Trade::CarpentryAndJoinery),
    ("Bathroom / Shower", Trade::Plumbing),
    ("Bathroom / Toilet", Trade::Plumbing),
    ("Bathroom / Walls", Trade::Painting),
    ("Bedroom / Carpets", Trade::FlooringCarpets),
    ("Bedroom / GPO", Trade::Electrical),
    ("Kitchen Area / Dishwasher", Trade::Appliances),
    ("Kitchen Area / Rangehood", Trade::Appliances),
    ("Kitchen Area / Sink", Trade::Plumbing),
    ("Living Area / Flooring", Trade::FlooringTimber),
];
