pub mod a005_rental_order;
