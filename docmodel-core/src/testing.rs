//! Model fixtures shared by unit tests.

use std::sync::OnceLock;

use crate::model::{DocumentModel, ModelState, SubModel};
use crate::schema::Schema;

macro_rules! state_wrapper {
    ($name:ident, $schema:expr) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(ModelState);

        impl SubModel for $name {
            fn schema() -> &'static Schema {
                static SCHEMA: OnceLock<Schema> = OnceLock::new();
                SCHEMA.get_or_init(|| $schema)
            }

            fn from_state(state: ModelState) -> Self {
                Self(state)
            }

            fn state(&self) -> &ModelState {
                &self.0
            }

            fn state_mut(&mut self) -> &mut ModelState {
                &mut self.0
            }
        }
    };
}

state_wrapper!(
    User,
    Schema::builder("User")
        .alias("n", "name")
        .alias("addr", "address")
        .fields(["age", "joined", "email"])
        .one::<Address>("address")
        .many::<Phone>("phones")
        .build()
);

state_wrapper!(
    Address,
    Schema::builder("Address")
        .alias("c", "city")
        .field("street")
        .one::<Geo>("geo")
        .build()
);

state_wrapper!(
    Geo,
    Schema::builder("Geo").one::<Zone>("zone").build()
);

state_wrapper!(Zone, Schema::builder("Zone").build());

state_wrapper!(Phone, Schema::builder("Phone").build());

state_wrapper!(
    Node,
    Schema::builder("Node").many::<Node>("children").build()
);

impl DocumentModel for User {
    const COLLECTION: &'static str = "users";
}

impl User {
    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn set_name(&mut self, name: &str) {
        self.set("name", name);
    }

    pub fn address(&self) -> Option<&Address> {
        self.embedded("address")
    }

    pub fn set_address(&mut self, address: Option<Address>) {
        self.set_embedded("address", address);
    }

    pub fn phones(&self) -> Vec<&Phone> {
        self.embedded_list("phones")
    }
}

impl Address {
    pub fn city(&self) -> Option<&str> {
        self.get_str("city")
    }

    pub fn set_city(&mut self, city: &str) {
        self.set("city", city);
    }

    pub fn geo(&self) -> Option<&Geo> {
        self.embedded("geo")
    }
}

impl Geo {
    pub fn zone(&self) -> Option<&Zone> {
        self.embedded("zone")
    }
}
