crate::solvers![blockade, keypad, maze];
