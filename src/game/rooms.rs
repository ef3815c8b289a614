/// Fallback label for scene ids missing from the table.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Human-readable label for a scene id, used to name saves.
pub fn room_display_name(scene: &str) -> &'static str {
    match scene {
        "SplashScreen" => "Game Start",
        "MainMenu" => "Main Menu",
        "Room01_Foyer" => "Foyer",
        "Room02_LivingRoom" => "Living Room",
        "Room03_Hallway" => "Hallway",
        "Room04_Kitchen" => "Kitchen",
        "Room05_DiningRoom" => "Dining Room",
        "Room06_ReturnHallway" => "Return Hallway",
        "Room07_LisaBedroom" => "Lisa's Bedroom",
        "Room08_LisaBathroom" => "Lisa's Bathroom",
        "Room09_MasterBathroom" => "Master Bathroom",
        "Room10_MasterBedroom" => "Master Bedroom",
        "LoadingScreen" => "Loading",
        "PauseMenu" => "Paused",
        "InventoryScreen" => "Inventory",
        "GameOver" => "Game Over",
        "Credits" => "Credits",
        "Tutorial" => "Tutorial",
        _ => UNKNOWN_LOCATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_rooms_have_labels() {
        assert_eq!(room_display_name("Room01_Foyer"), "Foyer");
        assert_eq!(room_display_name("Room07_LisaBedroom"), "Lisa's Bedroom");
    }

    #[test]
    fn unmapped_scene_falls_back() {
        assert_eq!(room_display_name("Room99_Attic"), UNKNOWN_LOCATION);
        assert_eq!(room_display_name(""), UNKNOWN_LOCATION);
    }
}
